//! Test fixtures for keys and update documents.

use larder_core::codec;
use larder_core::update::{SchemaVersionContent, UpdateDocument};
use larder_signer::{KeyPair, PayloadSigner};
use std::sync::LazyLock;

// Small keys keep key generation fast in debug builds.
const TEST_KEY_BITS: usize = 1024;

/// Key trusted by every [`TestServer`](super::TestServer).
pub static PUBLISHER: LazyLock<KeyPair> = LazyLock::new(|| {
    KeyPair::generate("publisher", TEST_KEY_BITS).expect("test key generation failed")
});

/// Key no test server trusts.
#[allow(dead_code)]
pub static OUTSIDER: LazyLock<KeyPair> = LazyLock::new(|| {
    KeyPair::generate("outsider", TEST_KEY_BITS).expect("test key generation failed")
});

/// A 40-character version token repeating the hex digit `c`.
#[allow(dead_code)]
pub fn version_token(c: char) -> String {
    std::iter::repeat_n(c, 40).collect()
}

/// Build an update document body from `(schema_version, content)` pairs.
#[allow(dead_code)]
pub fn update_body(version: &str, entries: &[(i64, &[u8])]) -> Vec<u8> {
    UpdateDocument {
        version: version.to_string(),
        schema_versions: entries
            .iter()
            .map(|(schema_version, content)| SchemaVersionContent {
                schema_version: *schema_version,
                content: codec::encode(content),
            })
            .collect(),
    }
    .to_json()
    .expect("update document serializes")
    .into_bytes()
}

/// Base64 signature of `body` by `key`.
#[allow(dead_code)]
pub fn sign_body(key: &KeyPair, body: &[u8]) -> String {
    let pem = key.to_private_pem().expect("private key encodes");
    PayloadSigner::from_pem(key.name.clone(), &pem)
        .expect("private key parses")
        .sign_base64(body)
        .expect("signing succeeds")
}
