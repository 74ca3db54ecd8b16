//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use std::fmt;
use time::OffsetDateTime;

/// The stored blob for one schema version.
///
/// At most one row exists per schema version.
#[derive(Clone, FromRow)]
pub struct RecordRow {
    pub schema_version: i32,
    pub version: String,
    pub content: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl fmt::Debug for RecordRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordRow")
            .field("schema_version", &self.schema_version)
            .field("version", &self.version)
            .field("content_len", &self.content.len())
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// A record without its content.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RecordSummaryRow {
    pub schema_version: i32,
    pub version: String,
    pub content_size: i64,
    pub updated_at: OffsetDateTime,
}

/// Whether a write replaces an existing row or creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Replace,
}

impl WriteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Replace => "replace",
        }
    }
}

/// One staged change for [`crate::repos::RecordRepo::apply_record_writes`].
#[derive(Clone, PartialEq, Eq)]
pub struct RecordWrite {
    pub kind: WriteKind,
    pub schema_version: i32,
    pub version: String,
    pub content: Vec<u8>,
}

impl fmt::Debug for RecordWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordWrite")
            .field("kind", &self.kind)
            .field("schema_version", &self.schema_version)
            .field("version", &self.version)
            .field("content_len", &self.content.len())
            .finish()
    }
}
