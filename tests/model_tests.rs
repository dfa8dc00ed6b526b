use access_control_lab::{
    error::ApiError,
    extract::format_validation_errors,
    models::{ProfileUpdateRequest, PromoteResponse, Role, User, UserResponse},
};
use serde_json::{Value, json};
use validator::Validate;

fn sorted_keys(value: &Value) -> Vec<&str> {
    let mut keys: Vec<&str> = value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort();
    keys
}

// --- Entity vs Response Shapes ---

#[test]
fn test_user_entity_serializes_every_column() {
    let user = User {
        id: 7,
        email: "test@example.com".to_string(),
        first_name: "Test".to_string(),
        last_name: "Person".to_string(),
        password_hash: "$argon2id$fake".to_string(),
        account_balance: Some(1234.5),
        is_active: true,
        passport_number: Some("FR000".to_string()),
        national_id: Some("999".to_string()),
        ..User::default()
    };

    let value = serde_json::to_value(&user).unwrap();

    // The raw entity leaks everything, renamed to camelCase
    assert_eq!(value["passwordHash"], "$argon2id$fake");
    assert_eq!(value["accountBalance"], 1234.5);
    assert_eq!(value["passportNumber"], "FR000");
    assert_eq!(value["nationalId"], "999");
    assert_eq!(value["active"], true);
    assert!(value.get("is_active").is_none());
    assert!(value["roles"].is_array());
}

#[test]
fn test_user_response_exposes_only_safe_fields() {
    let user = User {
        id: 7,
        email: "test@example.com".to_string(),
        first_name: "Test".to_string(),
        last_name: "Person".to_string(),
        password_hash: "$argon2id$fake".to_string(),
        account_balance: Some(1234.5),
        is_active: true,
        ..User::default()
    };

    let value = serde_json::to_value(UserResponse::from_user(user.clone())).unwrap();
    assert_eq!(
        sorted_keys(&value),
        vec!["active", "email", "firstName", "id", "lastName", "phoneNumber"]
    );

    let role = Role {
        id: 1,
        name: "ROLE_USER".to_string(),
        description: None,
    };
    let with_roles = serde_json::to_value(UserResponse::with_roles(user, &[role])).unwrap();
    assert_eq!(with_roles["roles"], json!(["ROLE_USER"]));
}

#[test]
fn test_promote_response_uses_camel_case() {
    let response = PromoteResponse {
        message: "User promoted to administrator".to_string(),
        user_id: 7,
    };

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(sorted_keys(&value), vec!["message", "userId"]);
}

// --- Deserialization Defaults ---

#[test]
fn test_partial_json_binds_onto_entity_defaults() {
    // This lenient binding is exactly what the mass assignment demo rides on:
    // any subset of columns deserializes, the rest silently default.
    let user: User = serde_json::from_value(json!({
        "email": "x@example.com",
        "firstName": "X"
    }))
    .unwrap();

    assert_eq!(user.id, 0);
    assert_eq!(user.email, "x@example.com");
    assert_eq!(user.first_name, "X");
    assert!(!user.is_active);
    assert!(user.password_hash.is_empty());
    assert!(user.account_balance.is_none());
    assert!(user.roles.is_empty());
}

#[test]
fn test_role_binds_by_name_alone() {
    let role: Role = serde_json::from_value(json!({ "name": "ROLE_ADMIN" })).unwrap();
    assert_eq!(role.id, 0);
    assert_eq!(role.name, "ROLE_ADMIN");
    assert!(role.description.is_none());
}

// --- Profile Update Validation ---

#[test]
fn test_profile_update_accepts_valid_input() {
    let request: ProfileUpdateRequest = serde_json::from_value(json!({
        "firstName": "John",
        "lastName": "Doe",
        "email": "john@example.com",
        "phoneNumber": "0612345678"
    }))
    .unwrap();

    assert!(request.validate().is_ok());

    // phoneNumber is optional
    let without_phone: ProfileUpdateRequest = serde_json::from_value(json!({
        "firstName": "John",
        "lastName": "Doe",
        "email": "john@example.com"
    }))
    .unwrap();
    assert!(without_phone.validate().is_ok());
}

#[test]
fn test_profile_update_rejects_blank_and_invalid_fields() {
    let request: ProfileUpdateRequest = serde_json::from_value(json!({
        "firstName": "",
        "lastName": "",
        "email": "nope"
    }))
    .unwrap();

    let errors = request.validate().unwrap_err();
    let message = format_validation_errors(&errors);
    assert!(message.contains("firstName must not be blank"));
    assert!(message.contains("lastName must not be blank"));
    assert!(message.contains("email must be a valid address"));
}

#[test]
fn test_profile_update_rejects_bad_phone_numbers() {
    for phone in ["12ab", "123", "+123456789012345678"] {
        let request: ProfileUpdateRequest = serde_json::from_value(json!({
            "firstName": "John",
            "lastName": "Doe",
            "email": "john@example.com",
            "phoneNumber": phone
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(
            format_validation_errors(&errors).contains("phoneNumber"),
            "{} should be rejected",
            phone
        );
    }
}

// --- Error Mapping ---

#[test]
fn test_error_codes_and_statuses() {
    let cases: Vec<(ApiError, u16, &str)> = vec![
        (ApiError::NotAuthenticated, 401, "NotAuthenticated"),
        (ApiError::Forbidden, 403, "Forbidden"),
        (ApiError::NotFound("User"), 404, "NotFound"),
        (ApiError::Conflict("taken".to_string()), 409, "Conflict"),
        (
            ApiError::Validation("bad".to_string()),
            400,
            "ValidationFailed",
        ),
        (ApiError::Internal("boom".to_string()), 500, "Internal"),
    ];

    for (error, status, code) in cases {
        assert_eq!(error.status().as_u16(), status);
        assert_eq!(error.code(), code);
    }
}
