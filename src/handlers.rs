use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;

use crate::{
    AppState,
    audit::AuditEvent,
    auth::AuthUser,
    error::ApiError,
    extract::ValidatedJson,
    models::{
        ExistsResponse, InfoResponse, ProfileUpdateRequest, PromoteResponse, ROLE_ADMIN,
        RoleGrantResponse, User, UserResponse,
    },
    seed,
};

// --- Secure Surface Handlers ---
//
// Every handler here runs behind the authentication middleware and, except
// for /me, behind a policy guard. By the time a handler body executes, the
// caller is authenticated and the access decision has already been made.

/// get_current_user
///
/// [Secure Route] Returns the authenticated caller's own profile, roles
/// included. There is no target id to mis-handle; the identity comes from
/// the verified credentials.
#[utoipa::path(
    get,
    path = "/secure/users/me",
    responses(
        (status = 200, description = "Own profile with roles", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.find_by_id(auth_user.id).await?;
    let roles = state.users.roles_of(user.id).await?;
    Ok(Json(UserResponse::with_roles(user, &roles)))
}

/// get_user_profile
///
/// [Secure Route] Reads one profile through the whitelist response type,
/// role names attached.
///
/// *Authorization*: the self guard has already established that the caller
/// IS the target. An admin asking for someone else's id was refused a layer
/// out.
#[utoipa::path(
    get,
    path = "/secure/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile with roles", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.find_by_id(id).await?;
    let roles = state.users.roles_of(user.id).await?;
    Ok(Json(UserResponse::with_roles(user, &roles)))
}

/// update_user_profile
///
/// [Secure Route] Updates the four whitelisted profile fields and nothing
/// else. The payload type cannot express balance, roles, the active flag or
/// identity documents, so there is nothing to filter.
///
/// *Ordering*: the self guard ran before the body was read; a cross-user
/// attempt with an invalid body still answers 403, never 400.
#[utoipa::path(
    put,
    path = "/secure/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_user_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.update_profile(id, &payload).await?;
    Ok(Json(UserResponse::from_user(user)))
}

/// get_all_users
///
/// [Secure Route] Lists every user through the whitelist response type, no
/// roles attached.
///
/// *Authorization*: the admin guard has already checked ROLE_ADMIN.
#[utoipa::path(
    get,
    path = "/secure/users/all",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller lacks ROLE_ADMIN")
    )
)]
pub async fn get_all_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.find_all().await?;
    let responses = users.into_iter().map(UserResponse::from_user).collect();
    Ok(Json(responses))
}

/// promote_user
///
/// [Secure Route] Grants ROLE_ADMIN to the target user and records who did
/// it. Granting a role the target already holds succeeds without
/// duplicating anything.
///
/// *Authorization*: the admin guard has already checked ROLE_ADMIN.
#[utoipa::path(
    post,
    path = "/secure/users/{id}/promote",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Promoted", body = PromoteResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller lacks ROLE_ADMIN"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn promote_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PromoteResponse>, ApiError> {
    let user = state.users.grant_role(id, ROLE_ADMIN).await?;

    state.audit.record(AuditEvent::RoleGranted {
        actor_id: Some(auth_user.id),
        actor_email: Some(auth_user.email),
        target_user_id: user.id,
        role: ROLE_ADMIN.to_string(),
        at: Utc::now(),
    });

    Ok(Json(PromoteResponse {
        message: "User promoted to administrator".to_string(),
        user_id: user.id,
    }))
}

// --- Vulnerable Surface Handlers ---
//
// No authentication, no authorization, no whitelisting. Each handler logs a
// structured warning under the `vulnerability` target so the class can watch
// the exploit land. This half of the application is the exhibit, not the
// example to follow.

/// vulnerable_update_user
///
/// [Vulnerable Route] Mass assignment in its classic form: the request body
/// deserializes into the full `User` entity and overwrites the stored row.
/// Clients control the balance, the active flag, identity documents, the
/// stored password hash and the role set of any user id they pick.
#[utoipa::path(
    put,
    path = "/vulnerable/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = User,
    responses(
        (status = 200, description = "Overwritten user, secrets included", body = User),
        (status = 404, description = "Unknown user or role")
    )
)]
pub async fn vulnerable_update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<User>,
) -> Result<Json<User>, ApiError> {
    let mut user = state.users.find_by_id(id).await?;

    tracing::warn!(
        target: "vulnerability",
        user_id = id,
        "mass assignment: full entity bound from request body"
    );

    // Indiscriminate field transfer. Absent payload keys arrive as the
    // type's defaults and overwrite real data all the same.
    user.email = payload.email;
    user.first_name = payload.first_name;
    user.last_name = payload.last_name;
    user.phone_number = payload.phone_number;
    user.passport_number = payload.passport_number;
    user.national_id = payload.national_id;
    user.is_active = payload.is_active;

    if let Some(balance) = payload.account_balance {
        tracing::warn!(
            target: "vulnerability",
            user_id = id,
            balance,
            "account balance overwritten by client"
        );
        user.account_balance = Some(balance);
    }

    if !payload.password_hash.is_empty() {
        tracing::warn!(
            target: "vulnerability",
            user_id = id,
            "stored password hash overwritten by client"
        );
        user.password_hash = payload.password_hash;
    }

    // Roles are resolved before any write so an unknown name or id fails
    // the whole request with nothing persisted.
    let mut replacement_roles = None;
    if !payload.roles.is_empty() {
        tracing::warn!(
            target: "vulnerability",
            user_id = id,
            "role set replaced by client"
        );
        let mut role_ids = Vec::with_capacity(payload.roles.len());
        for role in &payload.roles {
            // Positive ids resolve by id, everything else by name.
            let resolved = if role.id > 0 {
                state.repo.get_role_by_id(role.id).await?
            } else {
                state.repo.get_role_by_name(&role.name).await?
            };
            role_ids.push(resolved.ok_or(ApiError::NotFound("Role"))?.id);
        }
        replacement_roles = Some(role_ids);
    }

    // Profile row first: a save that fails (duplicate email, say) must not
    // leave a new role set behind.
    let saved = state
        .repo
        .save_user(&user)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    if let Some(role_ids) = replacement_roles {
        state.repo.replace_user_roles(id, &role_ids).await?;
    }
    let roles = state.repo.get_user_roles(saved.id).await?;

    Ok(Json(User { roles, ..saved }))
}

/// vulnerable_get_user
///
/// [Vulnerable Route] IDOR: any client may read any user's full record by
/// guessing the sequential id. The response carries the password hash,
/// balance, passport number and national id.
#[utoipa::path(
    get,
    path = "/vulnerable/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Full user record, secrets included", body = User),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn vulnerable_get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    tracing::warn!(
        target: "vulnerability",
        user_id = id,
        "IDOR: unauthenticated read of a full user record"
    );

    let user = state.users.find_by_id(id).await?;
    let roles = state.repo.get_user_roles(user.id).await?;
    Ok(Json(User { roles, ..user }))
}

/// vulnerable_list_users
///
/// [Vulnerable Route] Dumps every user record, secrets and roles included,
/// to anyone who asks.
#[utoipa::path(
    get,
    path = "/vulnerable/users/all",
    responses(
        (status = 200, description = "Every user record, secrets included", body = [User])
    )
)]
pub async fn vulnerable_list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    tracing::warn!(
        target: "vulnerability",
        "sensitive data exposure: full user list requested anonymously"
    );

    let users = state.users.find_all().await?;
    let mut enriched = Vec::with_capacity(users.len());
    for user in users {
        let roles = state.repo.get_user_roles(user.id).await?;
        enriched.push(User { roles, ..user });
    }
    Ok(Json(enriched))
}

/// vulnerable_promote_user
///
/// [Vulnerable Route] Missing function-level access control: promotes any
/// user to administrator with no credentials at all. The grant is real;
/// verify it through the vulnerable read endpoints.
#[utoipa::path(
    post,
    path = "/vulnerable/users/{id}/promote",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Promoted", body = PromoteResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn vulnerable_promote_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PromoteResponse>, ApiError> {
    tracing::warn!(
        target: "vulnerability",
        user_id = id,
        "missing access control: unauthenticated promotion to administrator"
    );

    let user = state.users.grant_role(id, ROLE_ADMIN).await?;

    state.audit.record(AuditEvent::RoleGranted {
        actor_id: None,
        actor_email: None,
        target_user_id: user.id,
        role: ROLE_ADMIN.to_string(),
        at: Utc::now(),
    });

    Ok(Json(PromoteResponse {
        message: "User promoted to administrator".to_string(),
        user_id: user.id,
    }))
}

/// vulnerable_add_role
///
/// [Vulnerable Route] Grants any role, by name, to any user, for anyone.
#[utoipa::path(
    post,
    path = "/vulnerable/users/{id}/add-role/{role_name}",
    params(
        ("id" = i64, Path, description = "User ID"),
        ("role_name" = String, Path, description = "Role name, e.g. ROLE_ADMIN")
    ),
    responses(
        (status = 200, description = "Role granted", body = RoleGrantResponse),
        (status = 404, description = "Unknown user or role")
    )
)]
pub async fn vulnerable_add_role(
    State(state): State<AppState>,
    Path((id, role_name)): Path<(i64, String)>,
) -> Result<Json<RoleGrantResponse>, ApiError> {
    tracing::warn!(
        target: "vulnerability",
        user_id = id,
        role = %role_name,
        "missing access control: unauthenticated role grant"
    );

    let user = state.users.grant_role(id, &role_name).await?;

    state.audit.record(AuditEvent::RoleGranted {
        actor_id: None,
        actor_email: None,
        target_user_id: user.id,
        role: role_name.clone(),
        at: Utc::now(),
    });

    Ok(Json(RoleGrantResponse {
        message: format!("Role {role_name} granted"),
        user_id: user.id,
        role: role_name,
    }))
}

/// vulnerable_user_exists
///
/// [Vulnerable Route] Enumeration oracle. Always 200; the body says whether
/// the id maps to an account, which turns sequential ids into a harvestable
/// directory.
#[utoipa::path(
    get,
    path = "/vulnerable/users/exists/{id}",
    params(("id" = i64, Path, description = "User ID to probe")),
    responses(
        (status = 200, description = "Existence disclosed", body = ExistsResponse)
    )
)]
pub async fn vulnerable_user_exists(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ExistsResponse>, ApiError> {
    tracing::warn!(
        target: "vulnerability",
        user_id = id,
        "enumeration oracle: account existence disclosed"
    );

    let exists = state.repo.user_exists(id).await?;
    Ok(Json(ExistsResponse { id, exists }))
}

// --- Public Handlers ---

/// get_info
///
/// [Public Route] Lab metadata: what this service is, the seeded accounts
/// to log in with, and where the two surfaces live.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Lab metadata", body = InfoResponse))
)]
pub async fn get_info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "access-control-lab".to_string(),
        purpose: "Demonstrates OWASP A01 broken access control next to a hardened mirror of the same API"
            .to_string(),
        demo_accounts: seed::demo_accounts(),
        surfaces: vec![
            "/secure/users".to_string(),
            "/vulnerable/users".to_string(),
        ],
        timestamp: Utc::now(),
    })
}
