//! Taskgraph REST API Server
//!
//! Serves the ticket hierarchy and link graph engine over HTTP, backed by
//! a JSON store directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskgraph::commands::CommandExecutor;
use taskgraph::config::TaskgraphConfig;
use taskgraph::storage::JsonFileStorage;

#[derive(Debug, Parser)]
#[command(name = "taskgraph-server", version, about = "REST API for the taskgraph engine")]
struct Args {
    /// Store directory holding data/store.json and config.toml
    #[arg(long, env = "TASKGRAPH_DATA_DIR", default_value = ".taskgraph")]
    data_dir: PathBuf,

    /// Address to listen on (overrides [server] bind)
    #[arg(long, env = "TASKGRAPH_BIND")]
    bind: Option<String>,

    /// Config file (defaults to <data-dir>/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TaskgraphConfig::load(path)?,
        None => TaskgraphConfig::load_from_dir(&args.data_dir)?,
    };

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Starting taskgraph API server...");

    let storage = JsonFileStorage::open(&args.data_dir).with_context(|| {
        format!(
            "Failed to open store at {}. Set TASKGRAPH_DATA_DIR or --data-dir to a writable directory.",
            args.data_dir.display()
        )
    })?;

    for member in config.members() {
        if storage.grant_access(member.project, member.user)? {
            info!(project_id = member.project, user_id = member.user, "Seeded membership");
        }
    }

    info!("Using store at: {}", storage.root().display());
    let executor = Arc::new(CommandExecutor::with_config(storage, config));
    let bind = args
        .bind
        .clone()
        .unwrap_or_else(|| executor.config().bind_address());
    let app = taskgraph_server::app(executor);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Server listening on http://{}", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
