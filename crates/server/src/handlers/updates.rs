//! Handler for publishing signed updates.

use crate::error::ApiResult;
use crate::metrics::{UPDATE_DURATION, UPDATE_ENTRIES_TOTAL, record_update_outcome};
use crate::service::ServiceError;
use crate::service::publish::{self, ApplyOutcome};
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use larder_core::SIGNATURE_HEADER;
use serde::Serialize;
use std::time::Instant;

/// Response for a committed update.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub version: String,
    pub created: Vec<i32>,
    pub replaced: Vec<i32>,
}

impl From<ApplyOutcome> for PublishResponse {
    fn from(outcome: ApplyOutcome) -> Self {
        Self {
            version: outcome.version,
            created: outcome.created,
            replaced: outcome.replaced,
        }
    }
}

fn outcome_label(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::AuthenticationFailure => "unauthenticated",
        ServiceError::InvalidContent(_) => "invalid",
        ServiceError::NotFound(_) | ServiceError::StorageFailure(_) => "storage_error",
    }
}

/// POST /v1/databases - Apply a signed update document.
///
/// The body is the raw update JSON. The base64 detached signature over those
/// exact bytes travels in `X-Update-Signature`.
pub async fn publish_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<PublishResponse>> {
    // A header that is not valid visible ASCII cannot hold base64.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str().unwrap_or_default());

    let payload = publish::authorize_and_parse(&body, signature, &state.trusted_keys)
        .inspect_err(|e| record_update_outcome(outcome_label(e)))?;

    tracing::debug!(
        version = %payload.version,
        schema_versions = ?payload.schema_versions(),
        bytes = payload.content_len(),
        "Applying update"
    );

    let timer = Instant::now();
    let outcome = publish::apply(state.metadata.as_ref(), payload)
        .await
        .inspect_err(|e| record_update_outcome(outcome_label(e)))?;
    UPDATE_DURATION.observe(timer.elapsed().as_secs_f64());

    record_update_outcome("applied");
    UPDATE_ENTRIES_TOTAL
        .with_label_values(&["created"])
        .inc_by(outcome.created.len() as u64);
    UPDATE_ENTRIES_TOTAL
        .with_label_values(&["replaced"])
        .inc_by(outcome.replaced.len() as u64);

    Ok(Json(outcome.into()))
}
