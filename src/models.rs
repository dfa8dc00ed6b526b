use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Role granted to every seeded account.
pub const ROLE_USER: &str = "ROLE_USER";
/// Role gating the admin-only operations (list all, promote).
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone regex is valid"));

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical user record from the `users` table, every sensitive column
/// included. The struct deserializes with `#[serde(default)]`, so arbitrary
/// JSON binds straight onto it and absent fields fall back to their defaults.
/// The vulnerable surface does exactly that (mass assignment); the secure
/// surface never builds this type from a request and never serializes it
/// outward.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    // Sequential primary key. Guessable on purpose: the enumeration and
    // IDOR demonstrations depend on it.
    pub id: i64,
    // Unique, doubles as the Basic-auth login name.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    // Argon2 hash. Leaks through the vulnerable surface only.
    pub password_hash: String,
    // Sensitive. Must never move through a secure endpoint.
    pub account_balance: Option<f64>,
    #[serde(rename = "active")]
    pub is_active: bool,
    // Sensitive identity documents.
    pub passport_number: Option<String>,
    pub national_id: Option<String>,
    /// Loaded separately through the `user_roles` join; not a column.
    #[sqlx(skip)]
    pub roles: Vec<Role>,
}

/// Role
///
/// A grantable role from the `roles` table. Deserializes with defaults so a
/// mass-assignment payload can name roles by id or by name alone.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// ProfileUpdateRequest
///
/// Whitelist input for profile updates on the secure surface. Balance,
/// roles, the active flag, passport number, national id and password are
/// not representable here; unknown JSON keys are dropped at
/// deserialization, so a smuggled `"accountBalance"` never reaches the
/// domain at all.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, message = "firstName must not be blank"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "lastName must not be blank"))]
    pub last_name: String,

    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    /// Optional; when present must be 10 to 15 digits with an optional
    /// leading `+`.
    #[validate(regex(
        path = *PHONE_RE,
        message = "phoneNumber must be 10 to 15 digits, optionally prefixed with +"
    ))]
    #[serde(default)]
    pub phone_number: Option<String>,
}

// --- Response Schemas (Output) ---

/// UserResponse
///
/// Whitelist output for the secure surface. Never carries the password
/// hash, balance, passport number or national id; role names are attached
/// only where the endpoint says so.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub active: bool,
    // Omitted from the JSON entirely when not loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl UserResponse {
    /// Projects a user without role information.
    pub fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            active: user.is_active,
            roles: None,
        }
    }

    /// Projects a user together with its role names.
    pub fn with_roles(user: User, roles: &[Role]) -> Self {
        let names = roles.iter().map(|role| role.name.clone()).collect();
        Self {
            roles: Some(names),
            ..Self::from_user(user)
        }
    }
}

/// PromoteResponse
///
/// Confirmation body for a promotion to administrator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromoteResponse {
    pub message: String,
    pub user_id: i64,
}

/// RoleGrantResponse
///
/// Confirmation body for the vulnerable add-role endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleGrantResponse {
    pub message: String,
    pub user_id: i64,
    pub role: String,
}

/// ExistsResponse
///
/// Enumeration oracle body. Answering at all is the vulnerability.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExistsResponse {
    pub id: i64,
    pub exists: bool,
}

/// InfoResponse
///
/// Lab metadata served by `GET /info`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: String,
    pub purpose: String,
    pub demo_accounts: Vec<DemoAccount>,
    pub surfaces: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// DemoAccount
///
/// A seeded account advertised by `GET /info`. Plaintext passwords are
/// published on purpose: logging in with them is the exercise.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemoAccount {
    pub email: String,
    pub password: String,
    pub roles: Vec<String>,
}
