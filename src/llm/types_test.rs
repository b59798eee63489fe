use super::*;
use crate::error::ErrorCode;

#[test]
fn error_codes_are_stable() {
    assert_eq!(LlmError::ConfigParse("x".into()).error_code(), "E_CONFIG_PARSE");
    assert_eq!(LlmError::MissingApiKey { var: "K".into() }.error_code(), "E_MISSING_API_KEY");
    assert_eq!(LlmError::EntityNotFound("m".into()).error_code(), "E_ENTITY_NOT_FOUND");
    assert_eq!(LlmError::EmptyResponse("SAFETY".into()).error_code(), "E_EMPTY_RESPONSE");
    assert_eq!(LlmError::ApiResponse { status: 400, body: String::new() }.error_code(), "E_API_RESPONSE");
}

#[test]
fn transport_and_server_errors_are_retryable() {
    assert!(LlmError::ApiRequest("reset".into()).retryable());
    assert!(LlmError::ApiResponse { status: 429, body: String::new() }.retryable());
    assert!(LlmError::ApiResponse { status: 503, body: String::new() }.retryable());
    assert!(!LlmError::ApiResponse { status: 400, body: String::new() }.retryable());
    assert!(!LlmError::EntityNotFound("m".into()).retryable());
}

#[test]
fn quota_is_only_429() {
    assert!(LlmError::ApiResponse { status: 429, body: String::new() }.is_quota());
    assert!(!LlmError::ApiResponse { status: 500, body: String::new() }.is_quota());
    assert!(!LlmError::ApiRequest("x".into()).is_quota());
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
    assert_eq!(serde_json::to_value(Role::Model).unwrap(), "model");
}

#[test]
fn message_constructors_set_role() {
    assert_eq!(Message::user("hi").role, Role::User);
    assert_eq!(Message::model("hello").role, Role::Model);
}
