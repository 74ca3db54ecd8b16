//! Update documents and their validation.
//!
//! An update is a JSON document carrying one `version` token and one or more
//! blobs keyed by schema version:
//!
//! ```json
//! {
//!   "version": "<40 lowercase hex chars>",
//!   "schema_versions": [
//!     {"schema_version": 1, "content": "<base64>"}
//!   ]
//! }
//! ```
//!
//! [`UpdatePayload::parse_and_validate`] is all-or-nothing: the first rule that
//! fails rejects the whole document.

use crate::codec;
use crate::error::InvalidContent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Smallest accepted schema version.
pub const SCHEMA_VERSION_MIN: i32 = 1;

/// Largest accepted schema version.
pub const SCHEMA_VERSION_MAX: i32 = 65536;

/// Exact length of a version token.
pub const VERSION_LEN: usize = 40;

/// Characters allowed in a version token.
pub const VERSION_ALPHABET: &str = "0123456789abcdef";

const KEY_VERSION: &str = "version";
const KEY_SCHEMA_VERSIONS: &str = "schema_versions";
const KEY_SCHEMA_VERSION: &str = "schema_version";
const KEY_CONTENT: &str = "content";

/// Whether `schema_version` lies in the accepted range.
pub fn is_valid_schema_version(schema_version: i64) -> bool {
    (i64::from(SCHEMA_VERSION_MIN)..=i64::from(SCHEMA_VERSION_MAX)).contains(&schema_version)
}

/// Check a version token: exactly 40 characters of lowercase hex.
pub fn validate_version(version: &str) -> Result<(), InvalidContent> {
    if version.chars().count() != VERSION_LEN {
        return Err(InvalidContent::VersionLength);
    }
    if !version.chars().all(|c| VERSION_ALPHABET.contains(c)) {
        return Err(InvalidContent::VersionCharacters);
    }
    Ok(())
}

/// Wire form of an update, as produced by publishing clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDocument {
    pub version: String,
    pub schema_versions: Vec<SchemaVersionContent>,
}

/// Wire form of one entry: base64 content for a schema version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersionContent {
    pub schema_version: i64,
    pub content: String,
}

impl UpdateDocument {
    /// Serialize to the exact JSON text that gets signed and sent.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }
}

/// One validated blob for a schema version.
#[derive(Clone, PartialEq, Eq)]
pub struct UpdateEntry {
    pub schema_version: i32,
    pub content: Vec<u8>,
}

impl std::fmt::Debug for UpdateEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateEntry")
            .field("schema_version", &self.schema_version)
            .field("content_len", &self.content.len())
            .finish()
    }
}

/// A validated update.
///
/// Schema versions are unique and in range, the version token is well formed
/// and every entry has non-empty content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatePayload {
    pub version: String,
    pub entries: Vec<UpdateEntry>,
}

/// Entry after the structural pass, before semantic checks.
struct RawEntry<'a> {
    schema_version: &'a Value,
    content: Option<Vec<u8>>,
}

impl UpdatePayload {
    /// Parse a raw update document and check every rule.
    pub fn parse_and_validate(raw: &str) -> Result<Self, InvalidContent> {
        let document: Value = serde_json::from_str(raw).map_err(|_| InvalidContent::Malformed)?;
        let object = document.as_object().ok_or(InvalidContent::Malformed)?;

        let version = object.get(KEY_VERSION).ok_or(InvalidContent::Malformed)?;
        let raw_entries = object
            .get(KEY_SCHEMA_VERSIONS)
            .and_then(Value::as_array)
            .ok_or(InvalidContent::Malformed)?;

        let raw_entries = raw_entries
            .iter()
            .map(|entry| entry.as_object().ok_or(InvalidContent::Malformed))
            .map(|entry| entry.and_then(parse_entry_structure))
            .collect::<Result<Vec<_>, _>>()?;

        let version = version.as_str().ok_or(InvalidContent::VersionNotString)?;
        validate_version(version)?;

        let mut seen = HashSet::with_capacity(raw_entries.len());
        let mut schema_versions = Vec::with_capacity(raw_entries.len());
        for entry in &raw_entries {
            let schema_version = match entry.schema_version.as_i64() {
                Some(schema_version) => schema_version,
                // An integer, just too large for i64
                None if entry.schema_version.is_u64() => {
                    return Err(InvalidContent::SchemaVersionOutOfRange);
                }
                None => return Err(InvalidContent::SchemaVersionNotInteger),
            };
            if !is_valid_schema_version(schema_version) {
                return Err(InvalidContent::SchemaVersionOutOfRange);
            }
            let schema_version =
                i32::try_from(schema_version).map_err(|_| InvalidContent::SchemaVersionOutOfRange)?;
            if !seen.insert(schema_version) {
                return Err(InvalidContent::SchemaVersionsNotUnique);
            }
            schema_versions.push(schema_version);
        }

        let mut entries = Vec::with_capacity(raw_entries.len());
        for (entry, schema_version) in raw_entries.into_iter().zip(schema_versions) {
            let content = entry.content.ok_or(InvalidContent::ContentNotBytes)?;
            if content.is_empty() {
                return Err(InvalidContent::ContentEmpty);
            }
            entries.push(UpdateEntry {
                schema_version,
                content,
            });
        }

        Ok(Self {
            version: version.to_string(),
            entries,
        })
    }

    /// Schema versions referenced by this payload, in entry order.
    pub fn schema_versions(&self) -> Vec<i32> {
        self.entries.iter().map(|e| e.schema_version).collect()
    }

    /// Total content size across all entries.
    pub fn content_len(&self) -> usize {
        self.entries.iter().map(|e| e.content.len()).sum()
    }

    /// Convert to the wire document, base64-encoding every blob.
    pub fn to_document(&self) -> UpdateDocument {
        UpdateDocument {
            version: self.version.clone(),
            schema_versions: self
                .entries
                .iter()
                .map(|e| SchemaVersionContent {
                    schema_version: i64::from(e.schema_version),
                    content: codec::encode(&e.content),
                })
                .collect(),
        }
    }
}

fn parse_entry_structure(entry: &Map<String, Value>) -> Result<RawEntry<'_>, InvalidContent> {
    let schema_version = entry
        .get(KEY_SCHEMA_VERSION)
        .ok_or(InvalidContent::Malformed)?;
    let content = match entry.get(KEY_CONTENT) {
        Some(Value::Null) => None,
        Some(Value::String(text)) => {
            Some(codec::decode(text).map_err(|_| InvalidContent::Malformed)?)
        }
        _ => return Err(InvalidContent::Malformed),
    };
    Ok(RawEntry {
        schema_version,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VERSION: &str = "0123456789abcdef0123456789abcdef01234567";

    fn doc(version: Value, entries: Value) -> String {
        json!({"version": version, "schema_versions": entries}).to_string()
    }

    fn entry(schema_version: Value, content: Value) -> Value {
        json!({"schema_version": schema_version, "content": content})
    }

    fn parse(raw: &str) -> Result<UpdatePayload, InvalidContent> {
        UpdatePayload::parse_and_validate(raw)
    }

    #[test]
    fn test_valid_document() {
        let raw = doc(
            json!(VERSION),
            json!([entry(json!(1), json!("MQ==")), entry(json!(65536), json!("Mg=="))]),
        );
        let payload = parse(&raw).unwrap();
        assert_eq!(payload.version, VERSION);
        assert_eq!(payload.schema_versions(), vec![1, 65536]);
        assert_eq!(payload.entries[0].content, b"1");
        assert_eq!(payload.entries[1].content, b"2");
        assert_eq!(payload.content_len(), 2);
    }

    #[test]
    fn test_empty_entry_list_is_accepted() {
        let payload = parse(&doc(json!(VERSION), json!([]))).unwrap();
        assert!(payload.entries.is_empty());
    }

    #[test]
    fn test_malformed_structure() {
        let cases = [
            "not json".to_string(),
            "[]".to_string(),
            json!({"schema_versions": []}).to_string(),
            json!({"version": VERSION}).to_string(),
            json!({"version": VERSION, "schema_versions": {}}).to_string(),
            doc(json!(VERSION), json!([1])),
            doc(json!(VERSION), json!([{"content": "MQ=="}])),
            doc(json!(VERSION), json!([{"schema_version": 1}])),
            doc(json!(VERSION), json!([entry(json!(1), json!(5))])),
            doc(json!(VERSION), json!([entry(json!(1), json!("@@@"))])),
        ];
        for raw in cases {
            assert_eq!(parse(&raw), Err(InvalidContent::Malformed), "{raw}");
        }
    }

    #[test]
    fn test_version_rules() {
        let entries = json!([entry(json!(1), json!("MQ=="))]);
        assert_eq!(
            parse(&doc(json!(1), entries.clone())),
            Err(InvalidContent::VersionNotString)
        );
        assert_eq!(
            parse(&doc(json!("abc"), entries.clone())),
            Err(InvalidContent::VersionLength)
        );
        assert_eq!(
            parse(&doc(json!(format!("{VERSION}8")), entries.clone())),
            Err(InvalidContent::VersionLength)
        );
        assert_eq!(
            parse(&doc(json!(VERSION.to_uppercase()), entries.clone())),
            Err(InvalidContent::VersionCharacters)
        );
        assert_eq!(
            parse(&doc(json!("g".repeat(40)), entries)),
            Err(InvalidContent::VersionCharacters)
        );
    }

    #[test]
    fn test_schema_version_rules() {
        let with = |sv: Value| doc(json!(VERSION), json!([entry(sv, json!("MQ=="))]));
        assert_eq!(
            parse(&with(json!("1"))),
            Err(InvalidContent::SchemaVersionNotInteger)
        );
        assert_eq!(
            parse(&with(json!(1.5))),
            Err(InvalidContent::SchemaVersionNotInteger)
        );
        assert_eq!(
            parse(&with(json!(0))),
            Err(InvalidContent::SchemaVersionOutOfRange)
        );
        assert_eq!(
            parse(&with(json!(65537))),
            Err(InvalidContent::SchemaVersionOutOfRange)
        );
        assert_eq!(
            parse(&with(json!(-1))),
            Err(InvalidContent::SchemaVersionOutOfRange)
        );
        assert_eq!(
            parse(&with(json!(i64::MAX))),
            Err(InvalidContent::SchemaVersionOutOfRange)
        );
        assert_eq!(
            parse(&with(json!(u64::MAX))),
            Err(InvalidContent::SchemaVersionOutOfRange)
        );
        let raw = format!(
            r#"{{"version":"{VERSION}","schema_versions":[{{"schema_version":18446744073709551615,"content":"MQ=="}}]}}"#
        );
        assert_eq!(parse(&raw), Err(InvalidContent::SchemaVersionOutOfRange));
    }

    #[test]
    fn test_duplicate_schema_versions() {
        let raw = doc(
            json!(VERSION),
            json!([
                entry(json!(3), json!("MQ==")),
                entry(json!(4), json!("MQ==")),
                entry(json!(3), json!("Mg=="))
            ]),
        );
        assert_eq!(parse(&raw), Err(InvalidContent::SchemaVersionsNotUnique));
    }

    #[test]
    fn test_content_rules() {
        assert_eq!(
            parse(&doc(json!(VERSION), json!([entry(json!(1), json!(null))]))),
            Err(InvalidContent::ContentNotBytes)
        );
        assert_eq!(
            parse(&doc(json!(VERSION), json!([entry(json!(1), json!(""))]))),
            Err(InvalidContent::ContentEmpty)
        );
    }

    #[test]
    fn test_version_checked_before_entries() {
        let raw = doc(json!("short"), json!([entry(json!(0), json!(""))]));
        assert_eq!(parse(&raw), Err(InvalidContent::VersionLength));
    }

    #[test]
    fn test_schema_versions_checked_before_content() {
        let raw = doc(
            json!(VERSION),
            json!([entry(json!(1), json!("")), entry(json!(1), json!("MQ=="))]),
        );
        assert_eq!(parse(&raw), Err(InvalidContent::SchemaVersionsNotUnique));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(InvalidContent::Malformed.to_string(), "Invalid content JSON");
        assert_eq!(
            InvalidContent::SchemaVersionOutOfRange.to_string(),
            "Schema version does not fall into required range"
        );
        assert_eq!(InvalidContent::ContentEmpty.to_string(), "Content is empty");
    }

    #[test]
    fn test_document_serialization_parses_back() {
        let payload = UpdatePayload {
            version: "1".repeat(40),
            entries: vec![UpdateEntry {
                schema_version: 1,
                content: b"1".to_vec(),
            }],
        };
        let json = payload.to_document().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"version":"1111111111111111111111111111111111111111","schema_versions":[{"schema_version":1,"content":"MQ=="}]}"#
        );
        assert_eq!(parse(&json).unwrap(), payload);
    }

    #[test]
    fn test_debug_hides_content() {
        let entry = UpdateEntry {
            schema_version: 7,
            content: vec![0; 1024],
        };
        let debug = format!("{entry:?}");
        assert!(debug.contains("content_len: 1024"));
    }
}
