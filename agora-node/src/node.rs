use std::sync::Arc;
use tokio::sync::RwLock;

use agora_engine::engine::Engine;
use agora_storage::journal::JournalStore;
use agora_storage::memory::MemoryStore;
use agora_storage::traits::KvStore;
use agora_types::constants::ONE_TOKEN;
use agora_types::error::TransitionError;
use agora_types::transition::{Receipt, Transition};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::rpc::types::ReceiptInfo;

/// The main node: the engine behind a journal, an RPC server, and a
/// periodic snapshot loop.
#[allow(dead_code)]
pub struct Node {
    config: NodeConfig,
    engine: Arc<RwLock<Engine>>,
    journal: Arc<JournalStore<Arc<dyn KvStore>>>,
    metrics: Arc<NodeMetrics>,
    rpc_handle: Option<jsonrpsee::server::ServerHandle>,
    receipt_tx: Option<tokio::sync::broadcast::Sender<ReceiptInfo>>,
}

/// Create a storage backend from the node configuration.
fn create_store(config: &NodeConfig) -> Result<Arc<dyn KvStore>, NodeError> {
    match config.storage.db_type.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => {
            let data_dir = std::path::Path::new(&config.storage.data_dir);
            std::fs::create_dir_all(data_dir)?;
            let db_path = data_dir.join("agora.db");
            let store =
                agora_storage::sqlite::SqliteStore::new(db_path.to_str().unwrap_or("agora.db"))
                    .map_err(NodeError::StorageError)?;
            Ok(Arc::new(store))
        }
        "rocksdb" => {
            let data_dir = std::path::Path::new(&config.storage.data_dir);
            std::fs::create_dir_all(data_dir)?;
            let db_path = data_dir.join("agora.rocksdb");
            let store = agora_storage::rocksdb::RocksDbStore::new(
                db_path.to_str().unwrap_or("agora.rocksdb"),
                None,
            )
            .map_err(NodeError::StorageError)?;
            Ok(Arc::new(store))
        }
        other => Err(NodeError::ConfigError {
            reason: format!(
                "unknown storage backend '{}', expected 'memory', 'sqlite', or 'rocksdb'",
                other
            ),
        }),
    }
}

/// Apply a transition through the shared engine and record the outcome.
///
/// On acceptance the transition is appended to the journal, metrics are
/// bumped, and subscribers are notified. A journal append failure is
/// logged but does not undo the accepted transition; the next snapshot
/// will still capture it.
pub(crate) async fn ingest_transition(
    engine: &RwLock<Engine>,
    journal: &JournalStore<Arc<dyn KvStore>>,
    metrics: &NodeMetrics,
    receipt_tx: Option<&tokio::sync::broadcast::Sender<ReceiptInfo>>,
    transition: &Transition,
) -> Result<Receipt, TransitionError> {
    let mut engine = engine.write().await;
    match engine.apply(transition) {
        Ok(receipt) => {
            drop(engine);
            if let Err(e) = journal.append_transition(receipt.sequence, transition) {
                tracing::warn!(
                    sequence = receipt.sequence,
                    "failed to journal transition: {}",
                    e
                );
            }
            metrics.transitions_accepted.inc();
            metrics.sequence.set(receipt.sequence as i64);
            if let Some(tx) = receipt_tx {
                let _ = tx.send(crate::rpc::handlers::receipt_info(transition, &receipt));
            }
            Ok(receipt)
        }
        Err(e) => {
            metrics.transitions_rejected.inc();
            Err(e)
        }
    }
}

/// Replay journaled transitions past the engine's current sequence.
///
/// Returns the number of transitions replayed. Any replay failure means
/// the journal disagrees with the snapshot it extends, which is a
/// corrupt store and a hard error.
fn replay_journal(
    journal: &JournalStore<Arc<dyn KvStore>>,
    engine: &mut Engine,
) -> Result<u64, NodeError> {
    let entries = journal.load_transitions_from(engine.sequence() + 1)?;
    let mut replayed = 0u64;
    for (sequence, transition) in entries {
        let receipt = engine
            .apply(&transition)
            .map_err(|e| NodeError::ReplayError {
                sequence,
                reason: e.to_string(),
            })?;
        if receipt.sequence != sequence {
            return Err(NodeError::ReplayError {
                sequence,
                reason: format!("journal key disagrees with assigned sequence {}", receipt.sequence),
            });
        }
        replayed += 1;
    }
    Ok(replayed)
}

impl Node {
    /// Create a new node from the given configuration.
    pub async fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let store = create_store(&config)?;
        let journal = Arc::new(JournalStore::new(store)?);

        // Resolve the genesis configuration: inline beats file, and a node
        // with neither falls back to the dev genesis.
        let genesis = if let Some(ref inline) = config.genesis_config {
            inline.clone()
        } else if let Some(ref path) = config.genesis_path {
            crate::genesis::load_genesis(path)?
        } else {
            tracing::warn!("no genesis configured, using the dev genesis");
            crate::genesis::dev_genesis().0
        };

        // Restore from the latest snapshot when one exists, then replay
        // journaled transitions past it. With no snapshot the journal is
        // replayed from genesis.
        let engine = match journal.load_snapshot()? {
            Some(snapshot) => {
                let mut engine = Engine::restore(snapshot);
                let replayed = replay_journal(&journal, &mut engine)?;
                tracing::info!(
                    sequence = engine.sequence(),
                    replayed,
                    "restored engine from snapshot"
                );
                engine
            }
            None => {
                let mut engine =
                    Engine::from_genesis(&genesis).map_err(|e| NodeError::GenesisError {
                        reason: e.to_string(),
                    })?;
                let replayed = replay_journal(&journal, &mut engine)?;
                if replayed > 0 {
                    tracing::info!(
                        sequence = engine.sequence(),
                        replayed,
                        "rebuilt engine from journal"
                    );
                }
                engine
            }
        };

        let engine = Arc::new(RwLock::new(engine));
        let metrics = Arc::new(NodeMetrics::new());

        // Start the RPC server if enabled.
        let (rpc_handle, receipt_tx) = if config.rpc.enabled {
            let (handle, tx) = crate::rpc::server::start_rpc_server(
                &config.rpc,
                engine.clone(),
                journal.clone(),
                metrics.clone(),
            )
            .await?;
            (Some(handle), Some(tx))
        } else {
            (None, None)
        };

        tracing::info!(
            rpc_enabled = config.rpc.enabled,
            db = %config.storage.db_type,
            "node initialized"
        );

        Ok(Self {
            config,
            engine,
            journal,
            metrics,
            rpc_handle,
            receipt_tx,
        })
    }

    /// Submit a transition directly, bypassing RPC.
    pub async fn submit_transition(
        &self,
        transition: &Transition,
    ) -> Result<Receipt, TransitionError> {
        ingest_transition(
            &self.engine,
            &self.journal,
            &self.metrics,
            self.receipt_tx.as_ref(),
            transition,
        )
        .await
    }

    /// Run the main node event loop.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        let snapshot_interval = tokio::time::interval(std::time::Duration::from_secs(
            self.config.storage.snapshot_interval_secs.max(1),
        ));
        tokio::pin!(snapshot_interval);

        tracing::info!("Node is running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                _ = snapshot_interval.tick() => {
                    self.persist_snapshot().await;
                    self.update_gauges().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal");
                    self.shutdown().await?;
                    return Ok(());
                }
            }
        }
    }

    /// Gracefully shut down the node.
    pub async fn shutdown(&mut self) -> Result<(), NodeError> {
        tracing::info!("Shutting down node...");

        // Stop the RPC server.
        if let Some(handle) = self.rpc_handle.take() {
            handle.stop().map_err(|e| NodeError::RpcError {
                reason: format!("failed to stop RPC server: {}", e),
            })?;
        }

        // Final snapshot so restart does not replay the whole journal.
        self.persist_snapshot().await;

        tracing::info!("Node shutdown complete");
        Ok(())
    }

    /// Access the engine (for testing).
    #[allow(dead_code)]
    pub fn engine(&self) -> &Arc<RwLock<Engine>> {
        &self.engine
    }

    /// Access the metrics (for testing).
    #[allow(dead_code)]
    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    /// Persist an engine snapshot and prune the journal behind it.
    async fn persist_snapshot(&self) {
        let snapshot = {
            let engine = self.engine.read().await;
            engine.snapshot()
        };
        let sequence = snapshot.sequence;
        if let Err(e) = self.journal.save_snapshot(&snapshot) {
            tracing::warn!("Failed to persist snapshot: {}", e);
            return;
        }
        match self.journal.prune_transitions_through(sequence) {
            Ok(pruned) if pruned > 0 => {
                tracing::debug!(sequence, pruned, "snapshot persisted, journal pruned");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to prune journal: {}", e),
        }
    }

    /// Refresh the state gauges from the engine.
    async fn update_gauges(&self) {
        let engine = self.engine.read().await;
        self.metrics.sequence.set(engine.sequence() as i64);
        self.metrics
            .total_supply_tokens
            .set((engine.ledger().total_supply / ONE_TOKEN) as i64);
        self.metrics
            .campaign_count
            .set(engine.campaigns().len() as i64);
        self.metrics
            .proposal_count
            .set(engine.governance().len() as i64);
        self.metrics.nft_count.set(engine.nfts().len() as i64);
    }
}
