use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::PaperboyError;

pub const INVALID_JSON_BODY: &str = "Invalid JSON body";
pub const RENDER_FAILED: &str = "Failed to render template";
pub const PDF_FAILED: &str = "Failed to generate PDF";
pub const GENERIC_FAILURE: &str = "Some error occurred, please try again";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(reason = %rejection.body_text(), "rejected request body");
        Self::bad_request(INVALID_JSON_BODY)
    }
}

/// Client errors keep their own message; server errors are logged in full
/// and answered with a fixed message.
impl From<PaperboyError> for ApiError {
    fn from(err: PaperboyError) -> Self {
        match err {
            PaperboyError::TemplateNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, err.to_string())
            }
            PaperboyError::InvalidOptions(message) => Self::bad_request(message),
            PaperboyError::Template(_) => {
                error!(error = %err, "template rendering failed");
                Self::internal(RENDER_FAILED)
            }
            PaperboyError::Network(_)
            | PaperboyError::Conversion { .. }
            | PaperboyError::Cdp(_)
            | PaperboyError::Launch(_)
            | PaperboyError::Script(_)
            | PaperboyError::InvalidWaitDelay { .. }
            | PaperboyError::Config(_) => {
                error!(error = %err, "pdf generation failed");
                Self::internal(PDF_FAILED)
            }
            other => {
                error!(error = %other, "request failed");
                Self::internal(GENERIC_FAILURE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
