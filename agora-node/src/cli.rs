use clap::{Parser, Subcommand};

use crate::error::NodeError;

#[derive(Parser)]
#[command(
    name = "agora",
    about = "Agora Node: deterministic contract-execution engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the node
    Run {
        /// Path to config file
        #[arg(short, long, default_value = "agora.toml")]
        config: String,
        /// Start in dev mode (funded treasury, SQLite storage, RPC on localhost)
        #[arg(long)]
        dev: bool,
        /// Override RPC listen address (e.g., "0.0.0.0:7910" for LAN access)
        #[arg(long)]
        rpc_addr: Option<String>,
        /// Storage backend: "sqlite" (default for --dev), "memory", "rocksdb"
        #[arg(long)]
        storage: Option<String>,
        /// Wipe the data directory before starting (useful after breaking upgrades)
        #[arg(long)]
        reset_state: bool,
        /// Override data directory path
        #[arg(long)]
        data_dir: Option<String>,
    },
    /// Initialize a new node configuration
    Init {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        dir: String,
    },
    /// Generate a genesis file from a genesis config
    Genesis {
        /// Path to genesis config file
        #[arg(short, long)]
        config: String,
        /// Output path for the genesis file
        #[arg(short, long, default_value = "genesis.json")]
        output: String,
    },
}

pub async fn run(cli: Cli) -> Result<(), NodeError> {
    match cli.command {
        Command::Run {
            config,
            dev,
            rpc_addr,
            storage,
            reset_state,
            data_dir,
        } => {
            crate::banner::print_banner();

            let mut config = if dev {
                let mut cfg = crate::config::NodeConfig::default();
                cfg.rpc.enabled = true;
                cfg.rpc.listen_addr = "127.0.0.1:7910".to_string();
                cfg.storage.db_type = "sqlite".to_string();
                let (dev_config, _) = crate::genesis::dev_genesis();
                cfg.chain_id = dev_config.chain_id.clone();
                cfg.genesis_config = Some(dev_config);
                cfg
            } else {
                crate::config::NodeConfig::load(&config)?
            };

            // Apply CLI overrides.
            if let Some(addr) = rpc_addr {
                config.rpc.listen_addr = addr;
            }
            if let Some(db) = storage {
                config.storage.db_type = db;
            }
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }

            // Wipe data directory if requested.
            if reset_state {
                let data_dir = &config.storage.data_dir;
                let path = std::path::Path::new(data_dir);
                if path.exists() {
                    tracing::warn!(data_dir = %data_dir, "wiping data directory (--reset-state)");
                    std::fs::remove_dir_all(path)?;
                    tracing::info!("data directory removed, starting with fresh state");
                } else {
                    tracing::info!(data_dir = %data_dir, "data directory does not exist, nothing to reset");
                }
            }

            // Print compact startup summary.
            {
                let dim = console::Style::new().dim();
                let cyan = console::Style::new().cyan();
                let mode = if dev {
                    format!("dev · {} storage", config.storage.db_type)
                } else {
                    format!("config · {} storage", config.storage.db_type)
                };
                println!(
                    "  {}    {}",
                    dim.apply_to("Chain"),
                    cyan.apply_to(&config.chain_id),
                );
                let rpc = if config.rpc.enabled {
                    config.rpc.listen_addr.clone()
                } else {
                    "disabled".to_string()
                };
                println!("  {}   {} (RPC)", dim.apply_to("Listen"), cyan.apply_to(rpc));
                println!("  {}     {}", dim.apply_to("Mode"), cyan.apply_to(mode));
                println!(
                    "  {}     {}",
                    dim.apply_to("Data"),
                    cyan.apply_to(&config.storage.data_dir),
                );
                println!();
            }

            let mut node = crate::node::Node::new(config).await?;
            node.run().await
        }
        Command::Init { dir } => {
            crate::config::NodeConfig::init(&dir)?;
            tracing::info!("Node configuration initialized in {}", dir);
            Ok(())
        }
        Command::Genesis { config, output } => {
            crate::genesis::generate_genesis(&config, &output)?;
            tracing::info!("Genesis file written to {}", output);
            Ok(())
        }
    }
}
