use agora_engine::engine::Engine;
use agora_types::constants::ONE_TOKEN;
use agora_types::genesis::{GenesisAllocation, GenesisConfig, GenesisRoleGrant};
use agora_types::governance::GovernanceParams;
use agora_types::primitives::Address;
use agora_types::roles::RoleSet;

use crate::error::NodeError;

/// Agora dev treasury address.
///
/// Every `--dev` node funds this address with 100M tokens at genesis and
/// grants it every role, so dev tooling can mint, administer, and seed
/// state without any further setup.
pub const DEV_TREASURY: Address = [
    0x7a, 0x90, 0x14, 0xc3, 0x5e, 0x2b, 0xd8, 0x4f, 0x66, 0x01, 0x9d, 0xaa, 0x37, 0xe8, 0x52, 0x0b,
    0xc4, 0x71, 0x00, 0x0a,
];

/// Create a dev genesis config with the treasury pre-funded and privileged.
///
/// Returns `(genesis_config, treasury_address)`.
pub fn dev_genesis() -> (GenesisConfig, Address) {
    let config = GenesisConfig {
        chain_id: "agora-dev".to_string(),
        timestamp: 1_700_000_000,
        allocations: vec![GenesisAllocation {
            address: DEV_TREASURY,
            amount: 100_000_000 * ONE_TOKEN, // 100M tokens (10^8 * 10^9 base units)
        }],
        roles: vec![GenesisRoleGrant {
            address: DEV_TREASURY,
            roles: RoleSet(RoleSet::ADMIN.0 | RoleSet::MINTER.0 | RoleSet::SLOT_ADMIN.0),
        }],
        governance: GovernanceParams {
            // Short windows so governance flows can be exercised in minutes.
            voting_delay: 60,
            voting_period: 600,
            timelock_delay: 120,
            quorum_percent: 4,
            proposal_threshold: 0,
        },
    };

    (config, DEV_TREASURY)
}

/// Generate a genesis file from a config file and write it to output.
///
/// The config is validated by booting an engine from it; the resulting
/// state root and initial supply are recorded alongside the config.
pub fn generate_genesis(config_path: &str, output_path: &str) -> Result<(), NodeError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| NodeError::GenesisError {
        reason: format!("failed to read genesis config '{}': {}", config_path, e),
    })?;

    let config: GenesisConfig =
        serde_json::from_str(&config_str).map_err(|e| NodeError::GenesisError {
            reason: format!("failed to parse genesis config: {}", e),
        })?;

    let engine = Engine::from_genesis(&config).map_err(|e| NodeError::GenesisError {
        reason: format!("invalid genesis config: {}", e),
    })?;

    let output = serde_json::json!({
        "config": config,
        "state_root": hex::encode(engine.state_root()),
        "total_supply": engine.ledger().total_supply.to_string(),
    });

    let json_str = serde_json::to_string_pretty(&output).map_err(|e| NodeError::GenesisError {
        reason: format!("failed to serialize genesis data: {}", e),
    })?;

    std::fs::write(output_path, json_str)?;

    Ok(())
}

/// Load a genesis config from a previously generated genesis file.
pub fn load_genesis(path: &str) -> Result<GenesisConfig, NodeError> {
    let contents = std::fs::read_to_string(path).map_err(|e| NodeError::GenesisError {
        reason: format!("failed to read genesis file '{}': {}", path, e),
    })?;

    let value: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| NodeError::GenesisError {
            reason: format!("failed to parse genesis file: {}", e),
        })?;

    let config: GenesisConfig =
        serde_json::from_value(value["config"].clone()).map_err(|e| NodeError::GenesisError {
            reason: format!("failed to parse genesis config: {}", e),
        })?;

    Ok(config)
}
