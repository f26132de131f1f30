use thiserror::Error;

/// Errors that can occur in the node.
#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names, dead_code)]
pub enum NodeError {
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    #[error("genesis error: {reason}")]
    GenesisError { reason: String },

    #[error("storage error: {0}")]
    StorageError(#[from] agora_storage::error::StorageError),

    #[error("engine error: {0}")]
    EngineError(#[from] agora_types::error::TransitionError),

    #[error("journal replay failed at sequence {sequence}: {reason}")]
    ReplayError { sequence: u64, reason: String },

    #[error("rpc error: {reason}")]
    RpcError { reason: String },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}
