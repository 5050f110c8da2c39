mod cli;
mod config;
mod panel;

use std::sync::Arc;

use clap::Parser;
use pylon_api::{HttpApi, PanelAdapter};
use pylon_core::RequestValidator;
use pylon_model::RuleCatalog;
use pylon_observe::init_logger;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{cli::Args, config::PaneldConfig, panel::Panel};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) config + logger
    let args = Args::parse();
    let mut config = PaneldConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    init_logger(&config.logger.clone().with_env_override()?)?;
    match &args.config {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no configuration file, using defaults"),
    }

    // 2) records + validation rules
    let panel = Arc::new(Panel::from_config(&config.inventory)?);
    let validator = RequestValidator::new(&RuleCatalog::new())?;
    info!(nodes = config.inventory.nodes.len(), "inventory ready");

    // 3) http
    let adapter = PanelAdapter::new(validator, Arc::clone(&panel), panel);
    let router = HttpApi::new(Arc::new(adapter)).router();

    let listener = TcpListener::bind(config.listen).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; shutting down");
    }
}
