use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
///
/// Every handler, guard and extractor funnels failures through this enum so
/// the wire format stays uniform: a flat `{ "error": <code>, "message": <text> }`
/// body with the matching HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unverifiable credentials. Always the same response no
    /// matter which verification step failed, so callers cannot probe
    /// whether an account exists.
    #[error("authentication required")]
    NotAuthenticated,

    /// The caller is authenticated but the policy said no. The body is
    /// deliberately generic; the specifics go to the audit log only.
    #[error("access denied")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code carried in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotAuthenticated => "NotAuthenticated",
            ApiError::Forbidden => "Forbidden",
            ApiError::NotFound(_) => "NotFound",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Validation(_) => "ValidationFailed",
            ApiError::Database(_) | ApiError::Internal(_) => "Internal",
        }
    }

    /// Human-readable text carried in the `message` field. Internal
    /// failures stay opaque to the client.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotAuthenticated => "Authentication required".to_string(),
            ApiError::Forbidden => "Access denied".to_string(),
            ApiError::NotFound(what) => format!("{what} not found"),
            ApiError::Conflict(message) => message.clone(),
            ApiError::Validation(message) => message.clone(),
            ApiError::Database(_) | ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Database(ref err) => tracing::error!(error = %err, "database failure"),
            ApiError::Internal(ref msg) => tracing::error!(error = %msg, "internal failure"),
            _ => {}
        }

        let status = self.status();
        let body = Json(json!({
            "error": self.code(),
            "message": self.user_message(),
        }));

        let mut response = (status, body).into_response();
        if matches!(self, ApiError::NotAuthenticated) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"access-control-lab\""),
            );
        }
        response
    }
}

/// True when the database rejected a write because a unique constraint
/// (in practice: `users.email`) was violated.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation),
        _ => false,
    }
}
