use axum::Json;
use axum::extract::{FromRequest, Request};
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// ValidatedJson
///
/// Json extractor that runs the payload through its `Validate` rules before
/// the handler sees it. Both a malformed body and a rule violation map to
/// the 400 `ValidationFailed` shape, with the per-field messages joined into
/// one line.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| ApiError::Validation(format_validation_errors(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// format_validation_errors
///
/// Flattens validator's error tree into a sorted, semicolon-joined message
/// line. Sorted so the output is stable regardless of field iteration order.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            match &error.message {
                Some(message) => messages.push(message.to_string()),
                None => messages.push(format!("{field} is invalid")),
            }
        }
    }
    messages.sort();
    messages.join("; ")
}
