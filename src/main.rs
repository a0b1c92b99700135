//! Swift webhook proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                  WEBHOOK PROXY                   │
//!   Client Request      │  ┌──────────┐   ┌──────────────┐                 │
//!   ────────────────────┼─▶│ request  │──▶│ config       │─────────────────┼──▶ Storage
//!                       │  │ id/trace │   │ writer       │                 │    service
//!                       │  └──────────┘   └──────────────┘                 │
//!                       │                                                  │
//!   Client Response     │  ┌──────────┐   ┌──────────────┐                 │
//!   ◀───────────────────┼──│ config   │◀──│ dispatcher   │◀────────────────┼─── Storage
//!                       │  │ reflector│   │              │──── POST ───────┼──▶ Webhook
//!                       │  └──────────┘   └──────────────┘                 │
//!                       └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use swift_webhook::config::{load_config, ProxyConfig};
use swift_webhook::observability::{logging, metrics};
use swift_webhook::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "swift-webhook")]
#[command(about = "Webhook notifications for Swift object storage", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "SWIFT_WEBHOOK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "swift-webhook starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        webhook_enabled = config.webhook.enabled,
        webhook_timeout_secs = config.webhook.timeout_secs,
        dispatch = ?config.webhook.dispatch,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
