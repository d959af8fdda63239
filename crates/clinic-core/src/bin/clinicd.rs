//! Clinic queue server
//!
//! Loads configuration, opens the database, starts the daily queue reset
//! and serves the REST API until Ctrl+C.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use clinic_core::{config::ClinicConfig, logging::setup_logging};

#[derive(Parser, Debug)]
#[command(author, version, about = "Clinic daily queue server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to serve the REST API on (overrides configuration)
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ClinicConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.api_bind_address = bind;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    setup_logging(&config.logging).context("failed to initialize logging")?;

    let clinic = clinic_core::init(&config)
        .await
        .context("failed to initialize clinic core")?;

    let addr: SocketAddr = config
        .api_bind_address
        .parse()
        .context("invalid api_bind_address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;

    info!("🏥 Clinic queue server listening on http://{}", addr);

    axum::serve(listener, clinic.router().into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(scheduler) = &clinic.scheduler {
        scheduler.abort();
    }
    clinic.engine.database().close().await;
    info!("🛑 Clinic queue server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
}
