use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::NodeError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Chain identity stamped into the engine at genesis.
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    pub storage: StorageConfig,
    pub rpc: RpcConfig,
    pub logging: LoggingConfig,
    /// Path to a genesis file. If set, load genesis state from this file.
    #[serde(default)]
    pub genesis_path: Option<String>,
    /// Inline genesis config (programmatic only, not serialized to TOML).
    #[serde(skip)]
    pub genesis_config: Option<agora_types::genesis::GenesisConfig>,
}

fn default_chain_id() -> String {
    "agora-dev".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Storage backend: "memory", "sqlite", or "rocksdb"
    pub db_type: String,
    /// Seconds between engine snapshots written to the journal store.
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
}

fn default_snapshot_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub enabled: bool,
    pub listen_addr: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            storage: StorageConfig {
                data_dir: dirs::home_dir()
                    .map(|h| h.join(".agora").join("data").to_string_lossy().into_owned())
                    .unwrap_or_else(|| "./agora-data".to_string()),
                db_type: "memory".to_string(),
                snapshot_interval_secs: default_snapshot_interval_secs(),
            },
            rpc: RpcConfig {
                enabled: true,
                listen_addr: "127.0.0.1:7910".to_string(),
                max_connections: 100,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            genesis_path: None,
            genesis_config: None,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, NodeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path, e),
        })?;
        let config: NodeConfig = toml::from_str(&contents).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to parse config file '{}': {}", path, e),
        })?;
        Ok(config)
    }

    /// Initialize a default configuration file in the given directory.
    pub fn init(dir: &str) -> Result<(), NodeError> {
        let dir_path = Path::new(dir);
        if !dir_path.exists() {
            std::fs::create_dir_all(dir_path)?;
        }

        let config = NodeConfig::default();
        let toml_str = toml::to_string_pretty(&config).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to serialize default config: {}", e),
        })?;

        let config_path = dir_path.join("agora.toml");
        std::fs::write(&config_path, toml_str)?;

        Ok(())
    }
}
