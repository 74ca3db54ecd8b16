//! Versioned record repository.

use crate::error::MetadataResult;
use crate::models::{RecordRow, RecordSummaryRow, RecordWrite};
use async_trait::async_trait;

/// Repository for versioned record operations.
#[async_trait]
pub trait RecordRepo: Send + Sync {
    /// Get the record stored for a schema version.
    async fn get_record(&self, schema_version: i32) -> MetadataResult<Option<RecordRow>>;

    /// Get the record for a schema version without loading its content.
    async fn get_record_summary(
        &self,
        schema_version: i32,
    ) -> MetadataResult<Option<RecordSummaryRow>>;

    /// Get every stored record whose schema version is in `schema_versions`.
    /// Missing schema versions are simply absent from the result.
    async fn get_records_batch(&self, schema_versions: &[i32]) -> MetadataResult<Vec<RecordRow>>;

    /// Apply all writes in a single transaction.
    ///
    /// Every write stores its row whether or not one exists by the time it
    /// runs; the write kind is informational. On any failure nothing is
    /// committed.
    async fn apply_record_writes(&self, writes: &[RecordWrite]) -> MetadataResult<()>;

    /// List all records without content, ordered by schema version.
    async fn list_record_summaries(&self) -> MetadataResult<Vec<RecordSummaryRow>>;
}
