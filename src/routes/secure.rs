use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{AppState, handlers, policy};

/// Secure Router Module
///
/// The hardened mirror of the user API. Mounted under `/secure/users` with
/// the authentication middleware wrapped around the whole router (applied
/// in `create_router`), so every request below is resolved to an `AuthUser`
/// exactly once.
///
/// Access Control Strategy:
/// Authorization is not handler code here. Each scoped sub-router carries a
/// policy guard as a route layer, which means the allow/deny decision runs
/// BEFORE body extraction and validation. A cross-user update with garbage
/// JSON is refused as 403, not 400, and the target record is never touched.
pub fn secure_routes(state: AppState) -> Router<AppState> {
    // Self-scoped: the caller must be the target of the request.
    let self_scoped = Router::new()
        // GET /secure/users/{id}
        // Reads one profile through the whitelist response type.
        // PUT /secure/users/{id}
        // Whitelisted profile update; only the four DTO fields can change.
        .route(
            "/{id}",
            get(handlers::get_user_profile).put(handlers::update_user_profile),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            policy::require_self,
        ));

    // Admin-scoped: the caller must hold ROLE_ADMIN.
    let admin_scoped = Router::new()
        // GET /secure/users/all
        // Lists every user as whitelist responses, no roles attached.
        .route("/all", get(handlers::get_all_users))
        // POST /secure/users/{id}/promote
        // Grants ROLE_ADMIN and records the grant in the audit trail.
        .route("/{id}/promote", post(handlers::promote_user))
        .route_layer(middleware::from_fn_with_state(
            state,
            policy::require_admin,
        ));

    Router::new()
        // GET /secure/users/me
        // The caller's own profile with roles; authentication is the only rule.
        .route("/me", get(handlers::get_current_user))
        .merge(self_scoped)
        .merge(admin_scoped)
}
