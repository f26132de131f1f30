use std::sync::Arc;
use tokio::sync::RwLock;

use jsonrpsee::server::{ServerBuilder, ServerHandle};

use agora_engine::engine::Engine;
use agora_storage::journal::JournalStore;
use agora_storage::traits::KvStore;

use super::handlers::{AgoraRpcImpl, AgoraRpcServer};
use super::types::ReceiptInfo;
use crate::config::RpcConfig;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;

/// Start the JSON-RPC HTTP+WS server.
pub async fn start_rpc_server(
    config: &RpcConfig,
    engine: Arc<RwLock<Engine>>,
    journal: Arc<JournalStore<Arc<dyn KvStore>>>,
    metrics: Arc<NodeMetrics>,
) -> Result<(ServerHandle, tokio::sync::broadcast::Sender<ReceiptInfo>), NodeError> {
    let server = ServerBuilder::default()
        .max_connections(config.max_connections as u32)
        .build(&config.listen_addr)
        .await
        .map_err(|e| NodeError::RpcError {
            reason: format!("failed to build RPC server: {}", e),
        })?;

    let (receipt_tx, _) = tokio::sync::broadcast::channel::<ReceiptInfo>(64);

    let rpc_impl = AgoraRpcImpl {
        engine,
        journal,
        metrics,
        receipt_tx: receipt_tx.clone(),
    };

    let handle = server.start(rpc_impl.into_rpc());

    tracing::info!(addr = %config.listen_addr, "RPC server started");

    Ok((handle, receipt_tx))
}
