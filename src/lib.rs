use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod password;
pub mod policy;
pub mod repository;
pub mod seed;
pub mod service;

// Module for routing segregation (Public, Secure, Vulnerable).
pub mod routes;
use auth::AuthUser; // The resolved authenticated caller identity.
use routes::{public, secure, vulnerable};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point
// (main.rs) and the integration tests.
pub use audit::{AuditState, MemoryAuditSink, TracingAuditSink};
pub use config::AppConfig;
pub use repository::{RepositoryState, SqliteRepository};
pub use service::UserService;

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application by aggregating every handler decorated with `#[utoipa::path]`
/// and every schema deriving `ToSchema`. The resulting JSON is served at
/// `/api-docs/openapi.json`. Documenting the vulnerable surface is
/// deliberate: the class needs to find it.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_current_user, handlers::get_user_profile, handlers::update_user_profile,
        handlers::get_all_users, handlers::promote_user,
        handlers::vulnerable_get_user, handlers::vulnerable_update_user,
        handlers::vulnerable_list_users, handlers::vulnerable_promote_user,
        handlers::vulnerable_add_role, handlers::vulnerable_user_exists,
        handlers::get_info
    ),
    components(
        schemas(
            models::User, models::Role, models::ProfileUpdateRequest, models::UserResponse,
            models::PromoteResponse, models::RoleGrantResponse, models::ExistsResponse,
            models::InfoResponse, models::DemoAccount,
        )
    ),
    tags(
        (name = "access-control-lab", description = "Broken Access Control teaching lab")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: one thread-safe, immutable
/// container holding every application service, shared across all requests.
#[derive(Clone)]
pub struct AppState {
    /// Service Layer: user business rules (uniqueness, hashing, grants).
    pub users: UserService,
    /// Repository Layer: direct persistence access. The vulnerable handlers
    /// and the seeder reach for it; the secure handlers go through `users`.
    pub repo: RepositoryState,
    /// Audit Layer: where denials and role grants are recorded.
    pub audit: AuditState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow extractors to selectively pull components
// from the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AuditState {
    fn from_ref(app_state: &AppState) -> AuditState {
        app_state.audit.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the secure router and caches the result.
///
/// *Mechanism*: extracting `AuthUser` verifies the Basic credentials against
/// the database; any failure rejects the request with 401 before a handler
/// runs. On success the resolved identity is stored in the request
/// extensions, where the policy guards and handlers pick it up again, so
/// the password is verified exactly once per request.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Secure Routes: policy guards are attached inside `secure_routes`;
        // the authentication layer added here wraps them, so it runs first
        // and the guards reuse its cached identity.
        .nest(
            "/secure/users",
            secure::secure_routes(state.clone()).route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Vulnerable Routes: mounted bare. The absence of layers here is
        // the exhibit.
        .nest("/vulnerable/users", vulnerable::vulnerable_routes())
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a span
                // carrying the request id, method and URI.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: returns the generated x-request-id
                // header to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation. Extracts the
/// `x-request-id` header (if present) and includes it in the structured
/// logging metadata alongside the HTTP method and URI, so every log line
/// for a single request is correlated by a unique id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
