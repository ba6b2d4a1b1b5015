//! Configuration for the peer and its collaborators

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Peer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Invocation ordering configuration
    pub peer: PeerConfig,

    /// Identity configuration
    pub identity: IdentityConfig,

    /// Event delivery configuration
    pub events: EventsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            rocksdb: RocksDBConfig::default(),
            peer: PeerConfig::default(),
            identity: IdentityConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 2,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Invocation ordering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Bounded mailbox size (backpressure on submitters)
    pub mailbox_capacity: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Identity configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Hex-encoded ed25519 public keys of trusted certificate issuers
    pub trusted_issuers: Vec<String>,
}

/// Event delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Per-subscriber broadcast buffer
    pub broadcast_capacity: usize,

    /// Also append every event to the RocksDB event log
    pub persist: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 256,
            persist: true,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML document
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("LOAN_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(issuers) = std::env::var("LOAN_TRUSTED_ISSUERS") {
            config.identity.trusted_issuers = issuers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(capacity) = std::env::var("LOAN_MAILBOX_CAPACITY") {
            config.peer.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid LOAN_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("./data/ledger"));
        assert_eq!(config.peer.mailbox_capacity, 1000);
        assert!(config.identity.trusted_issuers.is_empty());
        assert!(config.events.persist);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            data_dir = "/var/lib/loans"

            [identity]
            trusted_issuers = ["00"]
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/loans"));
        assert_eq!(config.identity.trusted_issuers, vec!["00".to_string()]);
        assert_eq!(config.peer.mailbox_capacity, 1000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml("data_dir = ["),
            Err(crate::Error::Config(_))
        ));
    }
}
