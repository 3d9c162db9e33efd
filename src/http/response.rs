//! Response envelopes produced by the gate.
//!
//! Every failure body is a JSON object under a single `error` key: a plain
//! message for admission denials, a field→message map for validation
//! failures. Success bodies are owned by the handlers.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Build an error response with a plain message body.
pub fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Build the 422 response for an accumulated validation failure.
pub fn validation_failed(errors: &HashMap<String, String>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": errors }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_json_status() {
        let response = error_json(StatusCode::UNAUTHORIZED, "nope");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_validation_failed_status() {
        let mut errors = HashMap::new();
        errors.insert("title".to_string(), "must be provided".to_string());
        let response = validation_failed(&errors);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
