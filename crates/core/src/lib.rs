//! Core domain types and shared logic for larder.
//!
//! This crate defines the pieces every other crate agrees on:
//! - Update documents and their validation rules
//! - Base64 codec for binary content carried in JSON
//! - Content digests used for integrity headers
//! - Typed configuration

pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod update;

pub use error::{Error, InvalidContent, Result};
pub use hash::ContentDigest;
pub use update::{
    SCHEMA_VERSION_MAX, SCHEMA_VERSION_MIN, SchemaVersionContent, UpdateDocument, UpdateEntry,
    UpdatePayload, VERSION_LEN,
};

/// Request header carrying the base64 detached signature of an update body.
pub const SIGNATURE_HEADER: &str = "x-update-signature";

/// Response header carrying the hex SHA-256 of served content.
pub const CONTENT_DIGEST_HEADER: &str = "x-content-sha256";

/// File name offered to clients downloading content.
pub const CONTENT_FILENAME: &str = "file.db.gz";
