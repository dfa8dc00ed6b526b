mod common;

use access_control_lab::{
    error::ApiError,
    models::{ProfileUpdateRequest, ROLE_ADMIN, ROLE_USER},
    password::{hash_password, verify_password},
    seed,
    service::{DEFAULT_ACCOUNT_BALANCE, NewUser},
};
use common::test_state;

fn new_user(email: &str, password: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password: password.to_string(),
        first_name: "Test".to_string(),
        last_name: "Person".to_string(),
        role: ROLE_USER.to_string(),
    }
}

// --- Seeding ---

#[tokio::test]
async fn test_seed_accounts_match_documentation() {
    let (state, _audit) = test_state().await;

    assert_eq!(state.repo.count_users().await.unwrap(), 3);
    assert_eq!(state.repo.count_roles().await.unwrap(), 2);

    let john = state.users.find_by_email("user@example.com").await.unwrap();
    assert_eq!(john.id, 1);
    assert_eq!(john.account_balance, Some(1000.0));
    assert_eq!(john.passport_number.as_deref(), Some("FR123456789"));

    let jane = state
        .users
        .find_by_email("admin@example.com")
        .await
        .unwrap();
    let jane_roles = state.users.roles_of(jane.id).await.unwrap();
    assert!(jane_roles.iter().any(|r| r.name == ROLE_ADMIN));

    let alice = state
        .users
        .find_by_email("alice@example.com")
        .await
        .unwrap();
    assert_eq!(alice.national_id.as_deref(), Some("1234567890123"));
}

#[tokio::test]
async fn test_seed_runs_once() {
    let (state, _audit) = test_state().await;

    // A second pass over an already populated database changes nothing
    seed::run(&state).await.unwrap();
    assert_eq!(state.repo.count_users().await.unwrap(), 3);
    assert_eq!(state.repo.count_roles().await.unwrap(), 2);
}

// --- Account Creation ---

#[tokio::test]
async fn test_create_user_applies_account_defaults() {
    let (state, _audit) = test_state().await;

    let created = state
        .users
        .create_user(new_user("new@example.com", "longenough1"))
        .await
        .unwrap();

    assert_eq!(created.id, 4);
    assert_eq!(created.account_balance, Some(DEFAULT_ACCOUNT_BALANCE));
    assert!(created.is_active);
    assert!(created.password_hash.starts_with("$argon2"));
    assert!(verify_password("longenough1", &created.password_hash));

    let roles = state.users.roles_of(created.id).await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, ROLE_USER);
}

#[tokio::test]
async fn test_create_user_rejects_short_password() {
    let (state, _audit) = test_state().await;

    let result = state
        .users
        .create_user(new_user("new@example.com", "short"))
        .await;

    match result {
        Err(ApiError::Validation(message)) => {
            assert!(message.contains("at least 8 characters"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_user_with_taken_email_conflicts() {
    let (state, _audit) = test_state().await;

    let result = state
        .users
        .create_user(new_user("user@example.com", "longenough1"))
        .await;

    assert!(matches!(result, Err(ApiError::Conflict(_))));
    assert_eq!(state.repo.count_users().await.unwrap(), 3);
}

#[tokio::test]
async fn test_create_user_with_unknown_role_fails() {
    let (state, _audit) = test_state().await;

    let mut request = new_user("new@example.com", "longenough1");
    request.role = "ROLE_GHOST".to_string();

    let result = state.users.create_user(request).await;
    assert!(matches!(result, Err(ApiError::NotFound("Role"))));
}

// --- Profile Updates ---

#[tokio::test]
async fn test_update_profile_touches_only_whitelisted_columns() {
    let (state, _audit) = test_state().await;

    let update = ProfileUpdateRequest {
        first_name: "Johnny".to_string(),
        last_name: "Doe".to_string(),
        email: "johnny@example.com".to_string(),
        phone_number: Some("+33611111111".to_string()),
    };

    let updated = state.users.update_profile(1, &update).await.unwrap();
    assert_eq!(updated.email, "johnny@example.com");
    assert_eq!(updated.phone_number.as_deref(), Some("+33611111111"));

    // Balance, credentials and flags are not reachable through this path
    assert_eq!(updated.account_balance, Some(1000.0));
    assert!(updated.is_active);
    assert!(verify_password("password123", &updated.password_hash));
}

#[tokio::test]
async fn test_update_profile_unknown_user() {
    let (state, _audit) = test_state().await;

    let update = ProfileUpdateRequest {
        first_name: "Nobody".to_string(),
        last_name: "Here".to_string(),
        email: "nobody@example.com".to_string(),
        phone_number: None,
    };

    let result = state.users.update_profile(99, &update).await;
    assert!(matches!(result, Err(ApiError::NotFound("User"))));
}

#[tokio::test]
async fn test_update_profile_email_collision_conflicts() {
    let (state, _audit) = test_state().await;

    let update = ProfileUpdateRequest {
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        email: "admin@example.com".to_string(),
        phone_number: None,
    };

    let result = state.users.update_profile(1, &update).await;
    match result {
        Err(ApiError::Conflict(message)) => {
            assert_eq!(message, "Email already in use: admin@example.com");
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

// --- Role Grants ---

#[tokio::test]
async fn test_grant_role_is_idempotent() {
    let (state, _audit) = test_state().await;

    state.users.grant_role(1, ROLE_ADMIN).await.unwrap();
    state.users.grant_role(1, ROLE_ADMIN).await.unwrap();

    let roles = state.users.roles_of(1).await.unwrap();
    let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec![ROLE_ADMIN, ROLE_USER]);
}

#[tokio::test]
async fn test_grant_unknown_role_fails() {
    let (state, _audit) = test_state().await;

    let result = state.users.grant_role(1, "ROLE_GHOST").await;
    assert!(matches!(result, Err(ApiError::NotFound("Role"))));
}

#[tokio::test]
async fn test_replace_user_roles_swaps_the_set() {
    let (state, _audit) = test_state().await;

    let admin_role = state
        .repo
        .get_role_by_name(ROLE_ADMIN)
        .await
        .unwrap()
        .unwrap();

    state
        .repo
        .replace_user_roles(1, &[admin_role.id])
        .await
        .unwrap();

    let roles = state.repo.get_user_roles(1).await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, ROLE_ADMIN);
}

// --- Password Hashing ---

#[test]
fn test_password_hashes_are_salted_and_verifiable() {
    let first = hash_password("password123").unwrap();
    let second = hash_password("password123").unwrap();

    assert_ne!(first, second);
    assert!(verify_password("password123", &first));
    assert!(!verify_password("password124", &first));
}

#[test]
fn test_malformed_hash_never_verifies() {
    assert!(!verify_password("password123", "not-a-phc-string"));
    assert!(!verify_password("password123", ""));
}
