//! Producing detached signatures for update documents.

use crate::error::{SignerError, SignerResult};
use crate::key::{KeyPair, PublicKey, SecretKey};
use base64::Engine;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha512;

/// Signs update documents with a publisher's private key.
pub struct PayloadSigner {
    keypair: KeyPair,
}

impl PayloadSigner {
    /// Create a new signer from a key pair.
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// Create from a PEM or OpenSSH private key document.
    pub fn from_pem(key_name: impl Into<String>, pem: &str) -> SignerResult<Self> {
        Ok(Self::new(KeyPair::from_pem(key_name, pem)?))
    }

    /// Get the key name.
    pub fn key_name(&self) -> &str {
        &self.keypair.name
    }

    /// Get the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    /// Sign the exact bytes of a document.
    pub fn sign(&self, message: &[u8]) -> SignerResult<Vec<u8>> {
        Self::sign_with(&self.keypair.secret, message)
    }

    /// Sign and encode the signature as standard base64, ready for the
    /// `X-Update-Signature` header.
    pub fn sign_base64(&self, message: &[u8]) -> SignerResult<String> {
        let signature = self.sign(message)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(signature))
    }

    pub(crate) fn sign_with(secret: &SecretKey, message: &[u8]) -> SignerResult<Vec<u8>> {
        let signing_key = SigningKey::<Sha512>::new(secret.rsa_key().clone());
        let signature = signing_key
            .try_sign(message)
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        Ok(signature.to_vec())
    }
}
