//! `ravealert-listener` - inbound CAP listener that authenticates, validates,
//! and stores uploaded alerts.

use anyhow::{bail, Context, Result};
use clap::Parser;
use ravealert_api::{serve, ApiState};
use ravealert_core::{init_logging, AppConfig};
use ravealert_store::AlertStore;
use std::path::PathBuf;
use tracing::info;

/// RaveAlert - CAP v1.2 inbound listener
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (overrides configuration)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    init_logging(&config.logging)?;

    if config.listener.users.is_empty() {
        bail!("no listener users configured; refusing to accept unauthenticated uploads");
    }

    let store = AlertStore::new(config.storage.write_dir.clone());
    info!(
        write_dir = %store.dir().display(),
        users = config.listener.users.len(),
        "starting CAP listener"
    );

    let state = ApiState::new(store, config.listener.users.clone());
    serve(&config.listener.bind_address(), state)
        .await
        .context("listener failed")?;
    Ok(())
}
