//! Demo server.
//!
//! ```text
//! GET  /api/value   → {"Hello":"World"}
//! GET  /api/values  → ["value1","value2"]
//! POST /api/echo    → the JSON request body
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use serde_json::{json, Value};

use simple_server::config::{load_config, ServerConfig};
use simple_server::lifecycle::signals::shutdown_signal;
use simple_server::observability::logging;
use simple_server::{HandlerError, WebServer};

/// Largest request body accepted by the echo route.
const ECHO_BODY_LIMIT: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "simple-server")]
#[command(about = "Minimal JSON web server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    logging::init(&config.observability);

    let endpoint = match cli.listen {
        Some(addr) => addr,
        None => config.listener.socket_addr()?,
    };

    tracing::info!(
        endpoint = %endpoint,
        max_connections = config.listener.max_connections,
        drain_timeout_secs = config.shutdown.drain_timeout_secs,
        "Configuration loaded"
    );

    let server = WebServer::from_config(&config);
    server
        .map_get("/api/value", |_| json!({"Hello": "World"}))?
        .map_get("/api/values", |_| ["value1", "value2"])?
        .map_post_async("/api/echo", |ctx| {
            Box::pin(async move {
                let body = ctx.read_body(ECHO_BODY_LIMIT).await?;
                let value: Value = serde_json::from_slice(&body)?;
                Ok::<_, HandlerError>(value)
            })
        })?;

    server.start(endpoint).await?;

    shutdown_signal().await;

    server.stop().await?;
    server.dispose();

    Ok(())
}
