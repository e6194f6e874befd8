//! eduai relay
//!
//! Same-origin front door for the visual tools, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!  Browser
//!     │
//!     ▼
//!  ┌──────────────────────────── RELAY SERVICE ─────────────────────────────┐
//!  │  listener ──▶ request-id / trace / body-limit layers ──▶ handlers      │
//!  │                                                          │             │
//!  │        ┌──────────────────────┬──────────────────────────┤             │
//!  │        ▼                      ▼                          ▼             │
//!  │  relay::notes       relay::translation           waitlist handlers    │
//!  │        └──────────┬───────────┘                          │             │
//!  │                   ▼                                      ▼             │
//!  │             BackendClient                         WaitlistStore        │
//!  └───────────────────┼──────────────────────────────────────┼─────────────┘
//!                      ▼                                      ▼
//!                 AI backend                        Postgres (or memory)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use eduai_relay::config::{load_config, RelayConfig};
use eduai_relay::lifecycle::{signals, Shutdown};
use eduai_relay::observability::{logging, metrics};
use eduai_relay::waitlist::{MemoryWaitlist, PgWaitlist, WaitlistStore};
use eduai_relay::HttpServer;

#[derive(Parser)]
#[command(name = "eduai-relay")]
#[command(about = "Same-origin relay for the eduai visual tools", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

async fn open_waitlist(
    config: &RelayConfig,
) -> Result<Arc<dyn WaitlistStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn WaitlistStore> = match config.database.url.as_deref() {
        Some(url) => Arc::new(PgWaitlist::connect(url, &config.database).await?),
        None => {
            tracing::warn!("No database configured; waitlist entries are kept in memory");
            Arc::new(MemoryWaitlist::new())
        }
    };

    store.ensure_schema().await?;
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "eduai-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.url,
        require_auth = config.relay.require_auth,
        max_text_chars = config.relay.max_text_chars,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let waitlist = open_waitlist(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    let server = HttpServer::new(config, waitlist)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
