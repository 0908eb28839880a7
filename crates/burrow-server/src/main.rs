//! Burrow server binary.
//!
//! # Usage
//!
//! ```bash
//! burrow /etc/burrow/burrow.toml
//! ```
//!
//! The configuration path may also be given via `BURROW_CONFIG`. With
//! neither set, built-in defaults are used (no clusters, no notifiers),
//! which is only useful for smoke-testing the HTTP surface.
//!
//! # Environment Variables
//!
//! - `BURROW_CONFIG`: path to the TOML configuration file
//! - `RUST_LOG`: log filter (default: info)

use anyhow::Context;
use burrow_core::BurrowConfig;
use burrow_server::Coordinator;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BURROW_CONFIG").ok());

    let config = match &config_path {
        Some(path) => {
            info!(path = %path, "loading configuration");
            BurrowConfig::load(path).with_context(|| format!("loading config from {}", path))?
        }
        None => {
            warn!("no configuration file given, using defaults");
            BurrowConfig::default()
        }
    };

    let mut coordinator = Coordinator::new(config).context("building subsystems")?;
    coordinator.start().await.context("starting subsystems")?;

    wait_for_shutdown_signal().await;
    info!("shutdown signal received");

    coordinator.stop().await;
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(error = %e, "cannot install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
