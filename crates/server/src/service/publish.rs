//! Authorizing and applying signed updates.

use super::{ServiceError, ServiceResult};
use larder_core::{InvalidContent, UpdatePayload, codec};
use larder_metadata::{MetadataStore, RecordRow, RecordWrite, WriteKind};
use larder_signer::TrustedKeySet;
use std::collections::HashSet;

/// Result of a committed update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// The version token now stored for every touched schema version.
    pub version: String,
    /// Schema versions that had no record before.
    pub created: Vec<i32>,
    /// Schema versions whose record was overwritten.
    pub replaced: Vec<i32>,
}

/// Verify the detached signature over the raw body, then validate it.
///
/// The signature covers the exact bytes received. Validation only runs once a
/// trusted key has accepted the body, so an unauthenticated caller never
/// learns why a document would be rejected.
pub fn authorize_and_parse(
    raw: &[u8],
    signature_b64: Option<&str>,
    trusted_keys: &TrustedKeySet,
) -> ServiceResult<UpdatePayload> {
    let signature_b64 = signature_b64
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ServiceError::AuthenticationFailure)?;
    let signature = codec::decode(signature_b64).map_err(|e| {
        tracing::debug!(error = %e, "Update signature is not valid base64");
        ServiceError::AuthenticationFailure
    })?;

    let signer = trusted_keys
        .find_signer(raw, &signature)
        .ok_or(ServiceError::AuthenticationFailure)?;
    tracing::debug!(
        fingerprint = %signer.fingerprint(),
        key = %signer.comment(),
        "Update signature verified"
    );

    let raw = std::str::from_utf8(raw).map_err(|_| InvalidContent::Malformed)?;
    Ok(UpdatePayload::parse_and_validate(raw)?)
}

/// Decide, for every entry, whether it replaces an existing record or creates one.
///
/// `existing` holds the currently stored records for the payload's schema
/// versions. Writes are returned in payload order.
pub fn plan(payload: UpdatePayload, existing: &[RecordRow]) -> Vec<RecordWrite> {
    let existing: HashSet<i32> = existing.iter().map(|row| row.schema_version).collect();
    let UpdatePayload { version, entries } = payload;

    entries
        .into_iter()
        .map(|entry| RecordWrite {
            kind: if existing.contains(&entry.schema_version) {
                WriteKind::Replace
            } else {
                WriteKind::Insert
            },
            schema_version: entry.schema_version,
            version: version.clone(),
            content: entry.content,
        })
        .collect()
}

/// Apply a validated payload: one batch read, then one atomic write.
pub async fn apply(store: &dyn MetadataStore, payload: UpdatePayload) -> ServiceResult<ApplyOutcome> {
    let version = payload.version.clone();
    let existing = store.get_records_batch(&payload.schema_versions()).await?;
    let writes = plan(payload, &existing);

    store.apply_record_writes(&writes).await?;

    let mut outcome = ApplyOutcome {
        version,
        created: Vec::new(),
        replaced: Vec::new(),
    };
    for write in &writes {
        match write.kind {
            WriteKind::Insert => outcome.created.push(write.schema_version),
            WriteKind::Replace => outcome.replaced.push(write.schema_version),
        }
    }

    tracing::info!(
        version = %outcome.version,
        created = ?outcome.created,
        replaced = ?outcome.replaced,
        "Update applied"
    );

    Ok(outcome)
}
