/// Error types for CityScope Service
///
/// Every failure leaving a handler is an [`AppError`]. Errors render as the
/// shared envelope `{ "success": false, "message": ..., "errors"?: [...] }`.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;

/// Result type for cityscope-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Input failed validation; carries one entry per offending field
    #[error("Validation errors")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or expired credential
    #[error("{0}")]
    Unauthorized(String),

    /// Entity absent or inactive
    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource
    #[error("{0}")]
    Conflict(String),

    /// Blob store failure while storing an image
    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation failure on one field
    pub fn invalid_field(field: &str, message: &str) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    /// Message exposed to the caller; internal details stay in the logs
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Upload(_) => "Image upload failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            AppError::Database(detail) | AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed with internal error");
            }
            AppError::Upload(detail) => {
                tracing::warn!(error = %detail, "image upload failed");
            }
            _ => {}
        }

        let mut body = serde_json::json!({
            "success": false,
            "message": self.public_message(),
        });
        if let AppError::Validation(errors) = self {
            body["errors"] = serde_json::json!(errors);
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("Invalid JSON body: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(crate::validation::field_errors(&errors))
    }
}

impl From<crypto_core::PasswordError> for AppError {
    fn from(err: crypto_core::PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crypto_core::TokenError> for AppError {
    fn from(err: crypto_core::TokenError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Route malformed JSON bodies through the shared error envelope
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

/// Route malformed query strings through the shared error envelope
pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}
