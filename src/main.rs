//! Game client gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                    GATEWAY                       │
//!                        │                                                  │
//!   Client Request       │  ┌─────────┐   ┌──────────┐   ┌─────────────┐    │
//!   ─────────────────────┼─▶│  http   │──▶│  store   │──▶│  routing    │    │
//!                        │  │ server  │   │ (mocks)  │   │  resolver   │    │
//!                        │  └─────────┘   └──────────┘   └──────┬──────┘    │
//!                        │                                      ▼           │
//!                        │                               ┌─────────────┐    │
//!                        │                               │  outbound   │    │
//!                        │                               │ normalizer  │────┼──▶ Upstream
//!                        │                               └─────────────┘    │
//!   Client Response      │  ┌─────────┐   ┌──────────┐   ┌─────────────┐    │
//!   ◀────────────────────┼──│  store  │◀──│ response │◀──│  forward    │◀───┼─── Upstream
//!                        │  │(recent) │   │normalizer│   │  (client)   │    │
//!                        │  └─────────┘   └──────────┘   └─────────────┘    │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use game_gateway::config::loader;
use game_gateway::lifecycle::{signals, Shutdown};
use game_gateway::observability::{logging, metrics};
use game_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "game-gateway")]
#[command(about = "Reverse proxy for mobile game clients", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = loader::load(args.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "game-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        block_city = %config.upstreams.block_city,
        pixelgun = %config.upstreams.pixelgun,
        fyber = %config.upstreams.fyber,
        store_capacity = config.store.capacity,
        verbose = config.observability.verbose,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(config)?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
