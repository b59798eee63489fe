//! API error surface.
//!
//! DESIGN
//! ======
//! Every error that can reach an HTTP client implements [`ErrorCode`]: a
//! stable, grepable code plus a retryable flag. Handlers convert it into an
//! [`ApiError`], which renders as `{code, message, retryable}` JSON with an
//! HTTP status chosen by the route.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Trait for errors that carry a machine-readable code.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// JSON body of every non-2xx API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: err.error_code().to_owned(),
                message: err.to_string(),
                retryable: err.retryable(),
            },
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody { code: "E_NOT_FOUND".into(), message: format!("{} not found", what.into()), retryable: false },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream busy")]
    struct Busy;

    impl ErrorCode for Busy {
        fn error_code(&self) -> &'static str {
            "E_BUSY"
        }

        fn retryable(&self) -> bool {
            true
        }
    }

    #[test]
    fn new_copies_code_message_and_retryable() {
        let err = ApiError::new(StatusCode::SERVICE_UNAVAILABLE, &Busy);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            err.body,
            ErrorBody { code: "E_BUSY".into(), message: "upstream busy".into(), retryable: true }
        );
    }

    #[test]
    fn not_found_names_the_missing_thing() {
        let err = ApiError::not_found("project 99");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body.code, "E_NOT_FOUND");
        assert_eq!(err.body.message, "project 99 not found");
        assert!(!err.body.retryable);
    }

    #[test]
    fn into_response_keeps_status() {
        let response = ApiError::new(StatusCode::TOO_MANY_REQUESTS, &Busy).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
