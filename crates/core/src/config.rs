//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest accepted update body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    /// SECURITY: When enabled, ensure this endpoint is network-restricted
    /// to authorized Prometheus scraper IPs only at the infrastructure level.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// PostgreSQL SSL mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database (testing and small deployments).
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Query timeout in seconds (advisory only, SQLite cannot cancel queries).
        /// Queries exceeding this duration are logged.
        #[serde(default = "default_sqlite_query_timeout_secs")]
        query_timeout_secs: Option<u64>,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host.
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer LARDER_METADATA__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// SSL mode for connections.
        ssl_mode: Option<PgSslMode>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Statement timeout in milliseconds.
        #[serde(default = "default_statement_timeout_ms")]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_max_connections() -> u32 {
    10
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

fn default_statement_timeout_ms() -> Option<u64> {
    Some(30_000)
}

fn default_sqlite_query_timeout_secs() -> Option<u64> {
    Some(60)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/larder.db"),
            query_timeout_secs: default_sqlite_query_timeout_secs(),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { .. } => Ok(()),
            MetadataConfig::Postgres {
                url,
                host,
                database,
                ..
            } => match (url.as_ref(), host.as_ref(), database.as_ref()) {
                (Some(_), _, _) => Ok(()),
                (None, Some(_), Some(_)) => Ok(()),
                (None, None, _) => Err(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ),
                (None, Some(_), None) => Err(
                    "postgres config requires 'database' when using individual fields".to_string(),
                ),
            },
        }
    }
}

/// Default environment prefix for publication keys.
pub const DEFAULT_KEY_ENV_PREFIX: &str = "LARDER_PUBLICATION_KEY_";

/// Where trusted publication keys come from.
///
/// Keys are OpenSSH RSA public keys. They are loaded once at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TrustedKeysConfig {
    /// Every `*.pub` file in a directory.
    Directory {
        /// Directory to scan.
        path: PathBuf,
    },
    /// Every environment variable whose name starts with a prefix.
    Env {
        /// Variable name prefix.
        #[serde(default = "default_key_env_prefix")]
        prefix: String,
    },
    /// Keys given directly in the configuration.
    Inline {
        /// OpenSSH public key lines.
        keys: Vec<String>,
    },
}

fn default_key_env_prefix() -> String {
    DEFAULT_KEY_ENV_PREFIX.to_string()
}

impl Default for TrustedKeysConfig {
    fn default() -> Self {
        Self::Directory {
            path: PathBuf::from("./keys"),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Trusted publication keys.
    #[serde(default)]
    pub trusted_keys: TrustedKeysConfig,
}

impl AppConfig {
    /// Create a test configuration.
    ///
    /// **For testing only.** Uses SQLite metadata and no trusted keys.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            metadata: MetadataConfig::default(),
            trusted_keys: TrustedKeysConfig::Inline { keys: Vec::new() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Figment;
    use figment::providers::{Env, Format, Toml};

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.max_body_bytes, 8 * 1024 * 1024);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(matches!(config.metadata, MetadataConfig::Sqlite { .. }));
        assert!(matches!(
            config.trusted_keys,
            TrustedKeysConfig::Directory { .. }
        ));
    }

    #[test]
    fn test_env_key_source_default_prefix() {
        let json = r#"{"type": "env"}"#;
        let config: TrustedKeysConfig = serde_json::from_str(json).unwrap();
        match config {
            TrustedKeysConfig::Env { prefix } => assert_eq!(prefix, DEFAULT_KEY_ENV_PREFIX),
            other => panic!("expected env key source, got {other:?}"),
        }
    }

    #[test]
    fn test_postgres_validate() {
        let with = |url: Option<&str>, host: Option<&str>, database: Option<&str>| {
            MetadataConfig::Postgres {
                url: url.map(String::from),
                host: host.map(String::from),
                port: Some(5432),
                username: None,
                password: None,
                database: database.map(String::from),
                ssl_mode: None,
                max_connections: 5,
                statement_timeout_ms: None,
            }
        };
        assert!(with(Some("postgres://localhost/larder"), None, None).validate().is_ok());
        assert!(with(None, Some("localhost"), Some("larder")).validate().is_ok());
        assert!(with(None, None, Some("larder")).validate().is_err());
        assert!(with(None, Some("localhost"), None).validate().is_err());
        assert!(MetadataConfig::default().validate().is_ok());
    }

    #[test]
    fn test_figment_toml_and_env_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "server.toml",
                r#"
                [server]
                bind = "127.0.0.1:9000"

                [metadata]
                type = "sqlite"
                path = "/tmp/larder.db"

                [trusted_keys]
                type = "directory"
                path = "/etc/larder/keys"
                "#,
            )?;
            jail.set_env("LARDER_SERVER__METRICS_ENABLED", "false");
            jail.set_env("LARDER_TRUSTED_KEYS__TYPE", "env");
            jail.set_env("LARDER_TRUSTED_KEYS__PREFIX", "DEPLOY_KEY_");

            let config: AppConfig = Figment::new()
                .merge(Toml::file("server.toml"))
                .merge(Env::prefixed("LARDER_").split("__"))
                .extract()?;

            assert_eq!(config.server.bind, "127.0.0.1:9000");
            assert!(!config.server.metrics_enabled);
            match config.trusted_keys {
                TrustedKeysConfig::Env { prefix } => assert_eq!(prefix, "DEPLOY_KEY_"),
                other => panic!("expected env key source, got {other:?}"),
            }
            Ok(())
        });
    }
}
