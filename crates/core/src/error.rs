//! Error types for the core domain.

use thiserror::Error;

/// Reason an update document was rejected.
///
/// Callers at the API boundary treat every variant as the same failure; the
/// individual messages exist for logs and tests.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidContent {
    #[error("Invalid content JSON")]
    Malformed,

    #[error("Version is not a string")]
    VersionNotString,

    #[error("Version length is not 40 characters")]
    VersionLength,

    #[error("Version contains invalid characters")]
    VersionCharacters,

    #[error("Schema version is not an integer")]
    SchemaVersionNotInteger,

    #[error("Schema version does not fall into required range")]
    SchemaVersionOutOfRange,

    #[error("Schema versions are not unique")]
    SchemaVersionsNotUnique,

    #[error("Content is not a byte sequence")]
    ContentNotBytes,

    #[error("Content is empty")]
    ContentEmpty,
}

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid content: {0}")]
    InvalidContent(#[from] InvalidContent),

    #[error("base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
