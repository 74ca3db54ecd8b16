//! API error types.

use crate::service::ServiceError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use larder_core::InvalidContent;
use larder_metadata::MetadataError;
use serde::Serialize;

/// Message returned for every rejected signature.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed")]
    Unauthorized,

    #[error("invalid content: {0}")]
    InvalidContent(InvalidContent),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "authentication_failed",
            Self::InvalidContent(_) => "invalid_content",
            Self::Internal(_) => "internal_error",
            Self::Metadata(_) => "storage_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidContent(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to clients.
    ///
    /// Content rule violations all read the same, and storage details stay in
    /// the server log.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized => AUTHENTICATION_FAILED.to_string(),
            Self::InvalidContent(_) => "Invalid content".to_string(),
            Self::Metadata(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(_) => self.to_string(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::AuthenticationFailure => Self::Unauthorized,
            ServiceError::InvalidContent(reason) => Self::InvalidContent(reason),
            ServiceError::NotFound(schema_version) => {
                Self::NotFound(format!("no database for schema version {schema_version}"))
            }
            ServiceError::StorageFailure(e) => Self::Metadata(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::InvalidContent(reason) => {
                tracing::debug!(reason = %reason, "Rejected update content");
            }
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => {}
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
