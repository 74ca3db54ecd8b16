//! Read path: the current record per schema version.

use super::{ServiceError, ServiceResult};
use larder_core::update::is_valid_schema_version;
use larder_metadata::{MetadataStore, RecordRow, RecordSummaryRow};

/// The current record for `schema_version`, content included.
pub async fn get_latest(store: &dyn MetadataStore, schema_version: i32) -> ServiceResult<RecordRow> {
    if !is_valid_schema_version(i64::from(schema_version)) {
        return Err(ServiceError::NotFound(schema_version));
    }
    store
        .get_record(schema_version)
        .await?
        .ok_or(ServiceError::NotFound(schema_version))
}

/// The current record for `schema_version` without its content.
pub async fn get_info(
    store: &dyn MetadataStore,
    schema_version: i32,
) -> ServiceResult<RecordSummaryRow> {
    if !is_valid_schema_version(i64::from(schema_version)) {
        return Err(ServiceError::NotFound(schema_version));
    }
    store
        .get_record_summary(schema_version)
        .await?
        .ok_or(ServiceError::NotFound(schema_version))
}

/// Every stored record without content, ordered by schema version.
pub async fn list(store: &dyn MetadataStore) -> ServiceResult<Vec<RecordSummaryRow>> {
    Ok(store.list_record_summaries().await?)
}
