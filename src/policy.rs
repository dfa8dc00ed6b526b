use axum::extract::{Path, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::AppState;
use crate::audit::{AuditEvent, AuditSink};
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Access Policy
///
/// The single source of truth for who may do what on the secure surface.
/// Handlers never re-derive these rules; the guards below evaluate them
/// before any handler or body extraction runs, which is why a cross-user
/// update with a garbage body still answers 403 rather than 400.
///
/// | Action             | Rule                              |
/// |--------------------|-----------------------------------|
/// | Read own profile   | principal id == target id         |
/// | Update own profile | principal id == target id         |
/// | List all users     | principal holds ROLE_ADMIN        |
/// | Promote a user     | principal holds ROLE_ADMIN        |
///
/// `/me` carries no target id and needs nothing beyond authentication. The
/// self rule is strict equality; administrators get no bypass on it. Every
/// denial is recorded to the audit sink before the generic 403 goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequest {
    ReadProfile { target_id: i64 },
    UpdateProfile { target_id: i64 },
    ListUsers,
    PromoteUser { target_id: i64 },
}

impl AccessRequest {
    /// Action label recorded in audit events.
    pub fn action(&self) -> &'static str {
        match self {
            AccessRequest::ReadProfile { .. } => "read_profile",
            AccessRequest::UpdateProfile { .. } => "update_profile",
            AccessRequest::ListUsers => "list_users",
            AccessRequest::PromoteUser { .. } => "promote_user",
        }
    }

    pub fn target_id(&self) -> Option<i64> {
        match self {
            AccessRequest::ReadProfile { target_id }
            | AccessRequest::UpdateProfile { target_id }
            | AccessRequest::PromoteUser { target_id } => Some(*target_id),
            AccessRequest::ListUsers => None,
        }
    }
}

/// evaluate
///
/// Applies the policy table to one access request. Denials are audited with
/// the actor, action and target before the `Forbidden` is returned; the
/// client-facing body stays generic.
pub fn evaluate(
    principal: &AuthUser,
    access: &AccessRequest,
    audit: &dyn AuditSink,
) -> Result<(), ApiError> {
    let allowed = match access {
        AccessRequest::ReadProfile { target_id } | AccessRequest::UpdateProfile { target_id } => {
            principal.id == *target_id
        }
        AccessRequest::ListUsers | AccessRequest::PromoteUser { .. } => principal.is_admin(),
    };

    if allowed {
        return Ok(());
    }

    audit.record(AuditEvent::AccessDenied {
        actor_id: principal.id,
        actor_email: principal.email.clone(),
        action: access.action(),
        target_id: access.target_id(),
        at: Utc::now(),
    });

    Err(ApiError::Forbidden)
}

/// require_self
///
/// Route-layer guard for `/secure/users/{id}` (GET and PUT). Runs after the
/// authentication middleware and before the handler; the request body has
/// not been touched yet when the decision is made.
pub async fn require_self(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(target_id): Path<i64>,
    request: Request,
    next: Next,
) -> Response {
    let access = if request.method() == Method::GET {
        AccessRequest::ReadProfile { target_id }
    } else {
        AccessRequest::UpdateProfile { target_id }
    };

    match evaluate(&auth_user, &access, state.audit.as_ref()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

/// require_admin
///
/// Route-layer guard for the admin-only routes. `/all` carries no path id;
/// `/{id}/promote` does, and the id feeds the audit trail on denial.
pub async fn require_admin(
    State(state): State<AppState>,
    auth_user: AuthUser,
    target: Option<Path<i64>>,
    request: Request,
    next: Next,
) -> Response {
    let access = match target {
        Some(Path(target_id)) => AccessRequest::PromoteUser { target_id },
        None => AccessRequest::ListUsers,
    };

    match evaluate(&auth_user, &access, state.audit.as_ref()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
