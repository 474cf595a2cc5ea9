//! edge-guard server.
//!
//! ```text
//!     Client ──► request id / trace / limits ──► CORS / security headers
//!            ──► compression ──┬─► CSP nonce ─► cookies ─► app handlers
//!                              └─► static mounts (SafeFileResolver)
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_guard::config::{load_config, GuardConfig};
use edge_guard::lifecycle::{spawn_signal_listener, startup, Shutdown};
use edge_guard::observability::{init_logging, metrics};
use edge_guard::HttpServer;

#[derive(Parser)]
#[command(name = "edge-guard")]
#[command(about = "Security middleware server", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("edge-guard v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        static_mounts = config.static_mounts.len(),
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

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let tls = config.listener.tls.clone();
    let server = HttpServer::new(config)?;
    match tls {
        Some(tls) => server.run_tls(&tls, shutdown.wait()).await?,
        None => {
            let listener = startup::bind_listener(server.config()).await?;
            server.run(listener, shutdown.wait()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
