//! offload-router
//!
//! HTTP router that keeps controller work off the accepting thread.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────────────┐
//!                 │                    OFFLOAD ROUTER                     │
//!                 │                                                       │
//!   Request       │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐   │
//!   ──────────────┼─▶│   http   │──▶│ routing  │──▶│ request context  │   │
//!                 │  │ listener │   │  table   │   │     builder      │   │
//!                 │  └──────────┘   └──────────┘   └────────┬─────────┘   │
//!                 │                                         │             │
//!                 │                                         ▼             │
//!                 │                        ┌──────────────────────────┐   │
//!                 │                        │  worker pool (N threads) │   │
//!                 │                        │  executor per worker     │   │
//!                 │                        └────────────┬─────────────┘   │
//!   Response      │  ┌──────────┐                       │                 │
//!   ◀─────────────┼──│ response │◀──────────────────────┘                 │
//!                 │  └──────────┘                                         │
//!                 └───────────────────────────────────────────────────────┘
//! ```
//!
//! The listener runs on a single-threaded runtime. Only the worker pool
//! spans several OS threads.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use offload_router::config::{load_config, validate_config, RouterConfig};
use offload_router::lifecycle::{self, Shutdown};
use offload_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "offload-router")]
#[command(about = "HTTP router executing controllers on a worker thread pool", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing one subdirectory per route group.
    #[arg(long)]
    api_dir: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:3000.
    #[arg(short, long)]
    bind: Option<String>,

    /// Number of worker threads.
    #[arg(short, long)]
    workers: Option<usize>,
}

impl Cli {
    fn apply(self, config: &mut RouterConfig) {
        if let Some(api_dir) = self.api_dir {
            config.api.folder_path = api_dir;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(workers) = self.workers {
            config.workers.pool_size = Some(workers);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    logging::init(&config.observability.log_level);
    tracing::info!("offload-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_folder = %config.api.folder_path.display(),
        workers = config.workers.resolved_pool_size(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = lifecycle::prepare(config, offload_router::api::catalog())?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
