use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. Nothing here touches user records; the only data published is
/// the lab's own metadata, demo credentials included (handing those out is
/// part of the exercise).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and liveness checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // GET /info
        // Lab metadata: purpose, seeded demo accounts, surface roots, timestamp.
        .route("/info", get(handlers::get_info))
}
