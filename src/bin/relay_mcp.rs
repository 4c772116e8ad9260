//! relay-mcp: Discourse tools over MCP.
//!
//! Speaks newline-delimited JSON-RPC on stdin/stdout. Logs go to stderr so
//! they never interleave with protocol frames.

use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use discourse_relay::Relay;
use discourse_relay::config::{Config, Secrets};
use discourse_relay::mcp::{self, ToolServer};

/// MCP tool server for the Discourse API.
#[derive(Parser)]
#[command(name = "relay-mcp")]
#[command(version = discourse_relay::PKG_VERSION)]
#[command(about = "MCP tool server for the Discourse API")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let relay = Relay::from_config(&config, &secrets).await?;

    info!(version = discourse_relay::version_string(), "relay-mcp starting");

    let server = Arc::new(ToolServer::new(Arc::new(relay)));
    let stdin = BufReader::new(tokio::io::stdin());
    mcp::serve(server, stdin, tokio::io::stdout()).await?;

    Ok(())
}
