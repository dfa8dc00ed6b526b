use std::sync::Arc;

use access_control_lab::{
    AppState, TracingAuditSink, UserService,
    audit::AuditState,
    config::{AppConfig, Env},
    create_router,
    repository::{self, RepositoryState, SqliteRepository},
    seed,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point, responsible for initializing all core
/// components: Configuration, Logging, Database, Seeding, and the HTTP
/// server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes RUST_LOG, falling back to sensible defaults. The `audit`
    // and `vulnerability` targets ride on the default level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "access_control_lab=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for humans watching the exploits land.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (SQLite)
    // Builds the pool and runs the embedded migrations. The default URL
    // keeps the whole lab in memory; it resets on restart.
    let pool = repository::connect(&config.db_url)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");

    let repo = Arc::new(SqliteRepository::new(pool)) as RepositoryState;
    let users = UserService::new(repo.clone());
    let audit = Arc::new(TracingAuditSink::new()) as AuditState;

    // 5. Unified State Assembly
    let app_state = AppState {
        users,
        repo,
        audit,
        config: config.clone(),
    };

    // 6. Demo Data
    // Idempotent: an already-populated database is left alone.
    seed::run(&app_state)
        .await
        .expect("FATAL: Failed to seed demo data.");

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("FATAL: Failed to bind listen address. Check BIND_ADDR.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("API documentation (Swagger UI) available under /swagger-ui");
    tracing::info!("Demo credentials available under /info");

    // The long-running Axum server process.
    axum::serve(listener, app).await.expect("server error");
}
