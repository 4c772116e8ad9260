//! relayd: Discourse relay daemon.
//!
//! Serves the [`ForumApi`](discourse_relay::ForumApi) operations as an HTTP
//! proxy, caching responses in the configured store.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use discourse_relay::config::{Config, Secrets};
use discourse_relay::{Relay, RelayError};

/// Caching HTTP proxy for the Discourse forum API.
#[derive(Parser)]
#[command(name = "relayd")]
#[command(version = discourse_relay::PKG_VERSION)]
#[command(about = "Caching HTTP proxy for the Discourse API")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    let relay = Relay::from_config(&config, &secrets).await?;
    if !relay.caching_enabled() {
        info!("response caching disabled");
    }

    // Parse address
    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| RelayError::Configuration(format!("Invalid address: {e}")))?;

    info!(version = discourse_relay::version_string(), %addr, "relayd starting");

    let app = discourse_relay::http::router(Arc::new(relay));
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("relayd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
