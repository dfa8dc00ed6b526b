#![allow(dead_code)]

use std::sync::Arc;

use access_control_lab::{
    AppConfig, AppState, MemoryAuditSink, SqliteRepository, UserService,
    audit::AuditState,
    repository::{self, RepositoryState},
    seed,
};
use tokio::net::TcpListener;

// --- Test Context and Setup ---

/// TestApp
///
/// Holds the address of a spawned server plus handles into its state so
/// tests can assert against the repository and the recorded audit trail.
pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub audit: Arc<MemoryAuditSink>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Builds an AppState backed by a fresh in-memory database, seeded with
/// the demo accounts (ids 1..=3: user@, admin@, alice@example.com).
pub async fn test_state() -> (AppState, Arc<MemoryAuditSink>) {
    let pool = repository::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory test database");

    let repo = Arc::new(SqliteRepository::new(pool)) as RepositoryState;
    let users = UserService::new(repo.clone());
    let audit_sink = Arc::new(MemoryAuditSink::new());
    let audit = audit_sink.clone() as AuditState;

    let state = AppState {
        users,
        repo,
        audit,
        config: AppConfig::default(),
    };

    seed::run(&state).await.expect("Failed to seed demo data");

    (state, audit_sink)
}

/// Spawns the full application on an ephemeral port and returns a TestApp.
/// Each call gets its own database, so tests never observe each other.
pub async fn spawn_app() -> TestApp {
    let (state, audit) = test_state().await;
    let router = access_control_lab::create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        state,
        audit,
    }
}
