//! Read handlers for the current record per schema version.

use crate::error::{ApiError, ApiResult};
use crate::metrics::{CONTENT_BYTES_SERVED, record_read};
use crate::service::query;
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use larder_core::{CONTENT_DIGEST_HEADER, CONTENT_FILENAME, ContentDigest};
use larder_metadata::RecordSummaryRow;
use serde::Serialize;

/// Metadata of one stored record.
#[derive(Debug, Serialize)]
pub struct DatabaseInfoResponse {
    pub schema_version: i32,
    pub version: String,
    pub content_size: i64,
    pub updated_at: String,
}

/// Listing of every stored record.
#[derive(Debug, Serialize)]
pub struct DatabaseListResponse {
    pub databases: Vec<DatabaseInfoResponse>,
}

fn summary_to_response(row: RecordSummaryRow) -> ApiResult<DatabaseInfoResponse> {
    let updated_at = row
        .updated_at
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| ApiError::Internal(format!("failed to format updated_at: {e}")))?;

    Ok(DatabaseInfoResponse {
        schema_version: row.schema_version,
        version: row.version,
        content_size: row.content_size,
        updated_at,
    })
}

/// GET /v1/databases/{schema_version} - Version of the current record.
pub async fn get_database_info(
    State(state): State<AppState>,
    Path(schema_version): Path<i32>,
) -> ApiResult<Json<DatabaseInfoResponse>> {
    record_read("info");
    let row = query::get_info(state.metadata.as_ref(), schema_version).await?;
    Ok(Json(summary_to_response(row)?))
}

/// GET /v1/databases/{schema_version}/content - Raw content of the current record.
///
/// The SHA-256 of the body is sent in `X-Content-SHA256` so clients can check
/// the download.
pub async fn get_database_content(
    State(state): State<AppState>,
    Path(schema_version): Path<i32>,
) -> ApiResult<Response> {
    record_read("content");
    let row = query::get_latest(state.metadata.as_ref(), schema_version).await?;
    let digest = ContentDigest::compute(&row.content);

    tracing::debug!(
        schema_version,
        version = %row.version,
        size = row.content.len(),
        "Serving record content"
    );
    CONTENT_BYTES_SERVED.inc_by(row.content.len() as u64);

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={CONTENT_FILENAME}"),
            ),
            (CONTENT_LENGTH, row.content.len().to_string()),
        ],
        [(CONTENT_DIGEST_HEADER, digest.to_hex())],
        Body::from(row.content),
    )
        .into_response())
}

/// GET /v1/databases - Every stored record, ordered by schema version.
pub async fn list_databases(
    State(state): State<AppState>,
) -> ApiResult<Json<DatabaseListResponse>> {
    record_read("list");
    let rows = query::list(state.metadata.as_ref()).await?;
    let databases = rows
        .into_iter()
        .map(summary_to_response)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(DatabaseListResponse { databases }))
}
