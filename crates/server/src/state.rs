//! Application state shared across handlers.

use larder_core::config::AppConfig;
use larder_metadata::MetadataStore;
use larder_signer::TrustedKeySet;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store holding the current record per schema version.
    pub metadata: Arc<dyn MetadataStore>,
    /// Public keys allowed to sign updates.
    pub trusted_keys: Arc<TrustedKeySet>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        trusted_keys: TrustedKeySet,
    ) -> Self {
        if trusted_keys.is_empty() {
            tracing::warn!("No trusted keys configured; every update will be rejected");
        }
        crate::metrics::TRUSTED_KEYS.set(trusted_keys.len() as i64);

        Self {
            config: Arc::new(config),
            metadata,
            trusted_keys: Arc::new(trusted_keys),
        }
    }
}
