//! The update pipeline and read path, independent of HTTP.
//!
//! [`publish`] authenticates, validates and applies updates; [`query`] serves
//! the current record per schema version. Both report failures as
//! [`ServiceError`], which the HTTP layer maps to responses.

pub mod publish;
pub mod query;

use larder_core::InvalidContent;
use larder_metadata::MetadataError;
use thiserror::Error;

/// Failure of an update or read operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No trusted key verified the signature, or no signature was supplied.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// The update document broke a structural or semantic rule.
    #[error("invalid content: {0}")]
    InvalidContent(#[from] InvalidContent),

    /// No record exists for the schema version.
    #[error("no record for schema version {0}")]
    NotFound(i32),

    /// The store failed; nothing from the current update was committed.
    #[error("storage failure: {0}")]
    StorageFailure(#[from] MetadataError),
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
