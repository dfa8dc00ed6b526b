use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once
/// loaded, shared across all services via the application state, and pulled
/// into extractors through FromRef.
#[derive(Clone)]
pub struct AppConfig {
    // SQLite connection string. The lab default keeps everything in memory.
    pub db_url: String,
    // Listen address for the HTTP server.
    pub bind_addr: String,
    // Runtime environment marker. Controls the log output format.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context: pretty logs and forgiving defaults locally,
/// JSON logs and mandatory configuration in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for
    /// test setup: in-memory database, ephemeral port.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration
    /// at startup. Reads everything from environment variables and follows
    /// the **fail-fast** principle.
    ///
    /// # Panics
    /// Panics if a variable required for the current runtime environment is
    /// missing. A lab that starts half-configured teaches the wrong lesson.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let db_url = match env {
            // Production must say where the data lives.
            Env::Production => {
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production")
            }
            // Locally the whole lab fits in memory and resets on restart.
            Env::Local => {
                env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
            }
        };

        Self {
            db_url,
            bind_addr,
            env,
        }
    }
}
