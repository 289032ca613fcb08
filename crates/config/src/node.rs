//! Operator-facing node configuration.
//!
//! Loaded from a TOML file in the data directory. The consensus parameter
//! block is normally absent (the network defaults apply); overriding it is
//! only meaningful for private test networks.

use crate::{ConfigError, ConsensusParams, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default file name for the auto-discovered validator peer list.
pub const DEFAULT_PEERS_FILE: &str = "validator_peers.conf";

/// Default port validators advertise in heartbeats.
pub const DEFAULT_NODE_PORT: u16 = 18_888;

/// Node configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Data directory for persisted state.
    pub data_dir: PathBuf,
    /// File name (inside `data_dir`) for the discovered peer list.
    pub peers_file: String,
    /// Address advertised in our heartbeats, e.g. `203.0.113.9:18888`.
    /// Empty when this node is not publicly reachable.
    pub listen_address: String,
    /// Port advertised in heartbeats.
    pub node_port: u16,
    /// Hex-encoded validator private key. Empty for non-validator nodes.
    pub validator_key: String,
    /// Consensus parameter override for private networks.
    pub consensus: ConsensusParams,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./veristake-data"),
            peers_file: DEFAULT_PEERS_FILE.to_string(),
            listen_address: String::new(),
            node_port: DEFAULT_NODE_PORT,
            validator_key: String::new(),
            consensus: ConsensusParams::mainnet(),
        }
    }
}

impl NodeConfig {
    /// Load a configuration file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: NodeConfig = toml::from_str(&contents)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded node configuration");
        Ok(config)
    }

    /// Write the configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.consensus.validate()?;
        if !self.validator_key.is_empty() {
            let stripped = self.validator_key.strip_prefix("0x").unwrap_or(&self.validator_key);
            if stripped.len() != 64 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidValidatorKey(
                    "expected 32 hex-encoded bytes".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Full path of the peers file.
    pub fn peers_path(&self) -> PathBuf {
        self.data_dir.join(&self.peers_file)
    }

    /// Whether this node is configured with a validator key.
    pub fn is_validator(&self) -> bool {
        !self.validator_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        NodeConfig::default().validate().unwrap();
    }

    #[test]
    fn test_validator_key_validation() {
        let mut config = NodeConfig {
            validator_key: "0xzz".to_string(),
            ..NodeConfig::default()
        };
        assert!(config.validate().is_err());

        config.validator_key = format!("0x{}", "ab".repeat(32));
        config.validate().unwrap();
        assert!(config.is_validator());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("veristake.toml");

        let config = NodeConfig {
            listen_address: "203.0.113.9:18888".to_string(),
            ..NodeConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = NodeConfig::load(&path).unwrap();
        assert_eq!(loaded.listen_address, config.listen_address);
        assert_eq!(loaded.consensus, config.consensus);
    }

    #[test]
    fn test_load_missing_file() {
        let err = NodeConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
