//! Loading trusted publication keys from their configured source.

use crate::error::{SignerError, SignerResult};
use crate::key::PublicKey;
use crate::verifier::TrustedKeySet;
use larder_core::config::TrustedKeysConfig;
use std::path::{Path, PathBuf};

/// File extension of OpenSSH public key files.
pub const PUBLIC_KEY_EXTENSION: &str = "pub";

/// Load the trusted key set described by `config`.
pub fn load(config: &TrustedKeysConfig) -> SignerResult<TrustedKeySet> {
    match config {
        TrustedKeysConfig::Directory { path } => load_from_directory(path),
        TrustedKeysConfig::Env { prefix } => load_from_env(prefix),
        TrustedKeysConfig::Inline { keys } => load_from_values(keys),
    }
}

/// Load every `*.pub` file in `dir`, in file name order.
///
/// A missing directory yields an empty set. Files holding non-RSA keys (for
/// example `id_ed25519.pub` next to `id_rsa.pub`) are skipped.
pub fn load_from_directory(dir: &Path) -> SignerResult<TrustedKeySet> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "Trusted key directory does not exist");
        return Ok(TrustedKeySet::empty());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(PUBLIC_KEY_EXTENSION)
        })
        .collect();
    paths.sort();

    let mut keys = Vec::with_capacity(paths.len());
    for path in paths {
        let line = std::fs::read_to_string(&path)?;
        match PublicKey::from_openssh(&line) {
            Ok(key) => {
                tracing::debug!(
                    path = %path.display(),
                    fingerprint = %key.fingerprint(),
                    "Loaded trusted key"
                );
                keys.push(key);
            }
            Err(SignerError::UnsupportedKeyType(algorithm)) => {
                tracing::warn!(
                    path = %path.display(),
                    algorithm = %algorithm,
                    "Skipping non-RSA public key"
                );
            }
            Err(e) => {
                return Err(SignerError::KeyParsing(format!("{}: {e}", path.display())));
            }
        }
    }

    Ok(TrustedKeySet::new(keys))
}

/// Load every environment variable whose name starts with `prefix`, in name order.
pub fn load_from_env(prefix: &str) -> SignerResult<TrustedKeySet> {
    load_from_vars(std::env::vars(), prefix)
}

fn load_from_vars(
    vars: impl Iterator<Item = (String, String)>,
    prefix: &str,
) -> SignerResult<TrustedKeySet> {
    let mut vars: Vec<(String, String)> = vars.filter(|(name, _)| name.starts_with(prefix)).collect();
    vars.sort();

    vars.into_iter()
        .map(|(name, value)| {
            PublicKey::from_openssh(&value).map_err(|e| match e {
                SignerError::UnsupportedKeyType(algorithm) => {
                    SignerError::UnsupportedKeyType(format!("{algorithm} in {name}"))
                }
                other => SignerError::KeyParsing(format!("{name}: {other}")),
            })
        })
        .collect::<SignerResult<Vec<_>>>()
        .map(TrustedKeySet::new)
}

/// Parse keys given inline as OpenSSH public key lines.
pub fn load_from_values(values: &[String]) -> SignerResult<TrustedKeySet> {
    values
        .iter()
        .map(|value| PublicKey::from_openssh(value))
        .collect::<SignerResult<Vec<_>>>()
        .map(TrustedKeySet::new)
}
