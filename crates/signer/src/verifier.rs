//! Detached signature verification against a set of trusted keys.
//!
//! Signatures are RSASSA-PKCS1-v1_5 over SHA-512. PSS is not accepted so that
//! publishing tools on other platforms can produce signatures with the most
//! widely available primitive.

use crate::error::{SignerError, SignerResult};
use crate::key::PublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use sha2::Sha512;

impl PublicKey {
    /// Verify `signature` over `message` with this key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> SignerResult<()> {
        let signature = Signature::try_from(signature)
            .map_err(|e| SignerError::InvalidSignature(e.to_string()))?;
        VerifyingKey::<Sha512>::new(self.rsa_key().clone())
            .verify(message, &signature)
            .map_err(|_| SignerError::VerificationFailed)
    }
}

/// Return true if any key in `keys` verifies `signature` over `message`.
///
/// An empty signature never verifies. A malformed signature or a key that does
/// not match only fails for that key; the remaining keys are still tried.
pub fn verify(keys: &[PublicKey], message: &[u8], signature: &[u8]) -> bool {
    find_signer(keys, message, signature).is_some()
}

fn find_signer<'a>(
    keys: &'a [PublicKey],
    message: &[u8],
    signature: &[u8],
) -> Option<&'a PublicKey> {
    if signature.is_empty() {
        return None;
    }
    keys.iter().find(|key| match key.verify(message, signature) {
        Ok(()) => true,
        Err(e) => {
            tracing::trace!(fingerprint = %key.fingerprint(), error = %e, "Key did not verify signature");
            false
        }
    })
}

/// The keys authorized to sign updates.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct TrustedKeySet {
    keys: Vec<PublicKey>,
}

impl TrustedKeySet {
    /// Create a set from parsed keys.
    pub fn new(keys: Vec<PublicKey>) -> Self {
        Self { keys }
    }

    /// A set that trusts nobody.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of trusted keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the keys.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PublicKey> {
        self.keys.iter()
    }

    /// Return true if any trusted key verifies `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify(&self.keys, message, signature)
    }

    /// The first trusted key that verifies `signature` over `message`.
    pub fn find_signer(&self, message: &[u8], signature: &[u8]) -> Option<&PublicKey> {
        find_signer(&self.keys, message, signature)
    }
}

impl From<Vec<PublicKey>> for TrustedKeySet {
    fn from(keys: Vec<PublicKey>) -> Self {
        Self::new(keys)
    }
}

impl FromIterator<PublicKey> for TrustedKeySet {
    fn from_iter<I: IntoIterator<Item = PublicKey>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
