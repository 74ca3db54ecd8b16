//! Update signing and verification for larder.
//!
//! This crate provides:
//! - RSA key generation and OpenSSH / PEM encodings
//! - Detached PKCS#1 v1.5 (SHA-512) signatures over update documents
//! - Verification against a trusted key set
//! - Loading trusted keys from a directory, the environment or config

pub mod error;
pub mod key;
pub mod keyring;
pub mod signer;
pub mod verifier;

pub use error::{SignerError, SignerResult};
pub use key::{DEFAULT_KEY_BITS, KeyPair, PublicKey, SecretKey};
pub use signer::PayloadSigner;
pub use verifier::{TrustedKeySet, verify};

#[cfg(test)]
pub(crate) mod test_keys {
    use crate::KeyPair;
    use std::sync::LazyLock;

    // Small keys keep key generation fast in debug builds.
    const TEST_KEY_BITS: usize = 1024;

    fn generate(name: &str) -> KeyPair {
        KeyPair::generate(name, TEST_KEY_BITS).expect("test key generation failed")
    }

    pub static KEY_A: LazyLock<KeyPair> = LazyLock::new(|| generate("publisher-a"));
    pub static KEY_B: LazyLock<KeyPair> = LazyLock::new(|| generate("publisher-b"));
    pub static KEY_C: LazyLock<KeyPair> = LazyLock::new(|| generate("outsider"));
}
