use access_control_lab::{
    audit::{AuditEvent, MemoryAuditSink},
    auth::AuthUser,
    error::ApiError,
    models::{ROLE_ADMIN, ROLE_USER},
    policy::{AccessRequest, evaluate},
};

// --- Test Data Helpers ---

fn plain_user() -> AuthUser {
    AuthUser {
        id: 1,
        email: "user@example.com".to_string(),
        roles: vec![ROLE_USER.to_string()],
    }
}

fn admin_user() -> AuthUser {
    AuthUser {
        id: 2,
        email: "admin@example.com".to_string(),
        roles: vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()],
    }
}

// --- Ownership Rules ---

#[test]
fn test_owner_may_read_and_update_own_profile() {
    let audit = MemoryAuditSink::new();
    let user = plain_user();

    assert!(evaluate(&user, &AccessRequest::ReadProfile { target_id: 1 }, &audit).is_ok());
    assert!(evaluate(&user, &AccessRequest::UpdateProfile { target_id: 1 }, &audit).is_ok());
    assert!(audit.events().is_empty());
}

#[test]
fn test_cross_user_access_denied_and_audited() {
    let audit = MemoryAuditSink::new();
    let user = plain_user();

    let result = evaluate(&user, &AccessRequest::ReadProfile { target_id: 9 }, &audit);
    assert!(matches!(result, Err(ApiError::Forbidden)));

    let events = audit.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        AuditEvent::AccessDenied {
            actor_id,
            actor_email,
            action,
            target_id,
            ..
        } => {
            assert_eq!(*actor_id, 1);
            assert_eq!(actor_email, "user@example.com");
            assert_eq!(*action, "read_profile");
            assert_eq!(*target_id, Some(9));
        }
        other => panic!("expected AccessDenied, got {:?}", other),
    }
}

#[test]
fn test_admin_has_no_ownership_bypass() {
    let audit = MemoryAuditSink::new();
    let admin = admin_user();

    // Ownership is strict equality even for administrators
    let read = evaluate(&admin, &AccessRequest::ReadProfile { target_id: 1 }, &audit);
    assert!(matches!(read, Err(ApiError::Forbidden)));

    let update = evaluate(
        &admin,
        &AccessRequest::UpdateProfile { target_id: 1 },
        &audit,
    );
    assert!(matches!(update, Err(ApiError::Forbidden)));

    // Their own profile is still theirs
    assert!(evaluate(&admin, &AccessRequest::ReadProfile { target_id: 2 }, &audit).is_ok());
}

// --- Administrative Rules ---

#[test]
fn test_listing_requires_admin_role() {
    let audit = MemoryAuditSink::new();

    let denied = evaluate(&plain_user(), &AccessRequest::ListUsers, &audit);
    assert!(matches!(denied, Err(ApiError::Forbidden)));
    assert!(matches!(
        audit.events()[0],
        AuditEvent::AccessDenied {
            action: "list_users",
            target_id: None,
            ..
        }
    ));

    assert!(evaluate(&admin_user(), &AccessRequest::ListUsers, &audit).is_ok());
}

#[test]
fn test_promotion_requires_admin_role() {
    let audit = MemoryAuditSink::new();

    let denied = evaluate(
        &plain_user(),
        &AccessRequest::PromoteUser { target_id: 1 },
        &audit,
    );
    assert!(matches!(denied, Err(ApiError::Forbidden)));

    // Admins may promote anyone, themselves included
    assert!(
        evaluate(
            &admin_user(),
            &AccessRequest::PromoteUser { target_id: 3 },
            &audit,
        )
        .is_ok()
    );
    assert!(
        evaluate(
            &admin_user(),
            &AccessRequest::PromoteUser { target_id: 2 },
            &audit,
        )
        .is_ok()
    );
}

#[test]
fn test_admin_flag_follows_role_names() {
    assert!(!plain_user().is_admin());
    assert!(admin_user().is_admin());
}
