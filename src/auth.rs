use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::ApiError;
use crate::models::ROLE_ADMIN;
use crate::password;
use crate::repository::RepositoryState;

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request: who is calling, and
/// with which roles. Guards and handlers receive this struct; none of them
/// ever see the raw credentials.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    /// Role names loaded through the join table at authentication time.
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ROLE_ADMIN)
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in middleware and handlers alike.
///
/// The process:
/// 1. Reuse: if the authentication middleware already resolved an identity
///    for this request, it sits in the request extensions and is returned
///    as-is. Credentials are verified at most once per request.
/// 2. Credential Parsing: `Authorization: Basic` header, base64 payload,
///    `email:password` split.
/// 3. Verification: user lookup by email, Argon2 password check, and an
///    active-account check.
///
/// Rejection: every failure mode returns the same 401 with a
/// `WWW-Authenticate` challenge. The response never reveals whether the
/// email exists, the password was wrong, or the account was deactivated.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Reuse the identity cached by the authentication middleware.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        // 2. Credential Parsing
        let (email, password) = parse_basic_credentials(parts)?;

        // 3. Verification
        let repo = RepositoryState::from_ref(state);
        let user = repo
            .get_user_by_email(&email)
            .await?
            .ok_or(ApiError::NotAuthenticated)?;

        if !password::verify_password(&password, &user.password_hash) {
            return Err(ApiError::NotAuthenticated);
        }
        if !user.is_active {
            return Err(ApiError::NotAuthenticated);
        }

        let roles = repo
            .get_user_roles(user.id)
            .await?
            .into_iter()
            .map(|role| role.name)
            .collect();

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            roles,
        })
    }
}

/// parse_basic_credentials
///
/// Pulls `email:password` out of an `Authorization: Basic` header. Malformed
/// input of any shape maps to the uniform 401.
fn parse_basic_credentials(parts: &Parts) -> Result<(String, String), ApiError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::NotAuthenticated)?;

    let encoded = header_value
        .strip_prefix("Basic ")
        .ok_or(ApiError::NotAuthenticated)?;

    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|_| ApiError::NotAuthenticated)?;
    let credentials = String::from_utf8(decoded).map_err(|_| ApiError::NotAuthenticated)?;

    let (email, password) = credentials
        .split_once(':')
        .ok_or(ApiError::NotAuthenticated)?;

    Ok((email.to_string(), password.to_string()))
}
