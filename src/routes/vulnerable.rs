use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, handlers};

/// Vulnerable Router Module
///
/// The broken mirror, mounted under `/vulnerable/users`. No authentication
/// layer, no guards, entity types on the wire in both directions. Every
/// route here maps to a named OWASP A01 failure; the handlers log which one
/// as it happens.
///
/// Do not take anything in this module as an example to follow.
pub fn vulnerable_routes() -> Router<AppState> {
    Router::new()
        // GET /vulnerable/users/{id}
        // IDOR: any id readable by anyone, secrets included.
        // PUT /vulnerable/users/{id}
        // Mass assignment: the full entity binds from the request body.
        .route(
            "/{id}",
            get(handlers::vulnerable_get_user).put(handlers::vulnerable_update_user),
        )
        // GET /vulnerable/users/all
        // Sensitive data exposure: the complete user table, hashes and all.
        .route("/all", get(handlers::vulnerable_list_users))
        // POST /vulnerable/users/{id}/promote
        // Missing function-level access control: anonymous privilege escalation.
        .route("/{id}/promote", post(handlers::vulnerable_promote_user))
        // POST /vulnerable/users/{id}/add-role/{role_name}
        // Same failure, arbitrary role edition.
        .route(
            "/{id}/add-role/{role_name}",
            post(handlers::vulnerable_add_role),
        )
        // GET /vulnerable/users/exists/{id}
        // Enumeration oracle for harvesting valid account ids.
        .route("/exists/{id}", get(handlers::vulnerable_user_exists))
}
