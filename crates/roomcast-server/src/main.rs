//! Roomcast server binary.
//!
//! # Usage
//!
//! ```bash
//! # Self-signed certificate on the default port (development)
//! roomcast-server
//!
//! # Custom port via the environment
//! PORT=8080 roomcast-server
//!
//! # TLS certificate (production)
//! roomcast-server --host 0.0.0.0 --port 443 --cert cert.pem --key key.pem
//! ```

use clap::Parser;
use roomcast_core::{RouterConfig, message::WELCOME_TEXT};
use roomcast_server::{Server, ServerRuntimeConfig, socket_address};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Roomcast chat relay server
#[derive(Parser, Debug)]
#[command(name = "roomcast-server")]
#[command(about = "Room-based chat relay over QUIC")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Path to TLS certificate (PEM format)
    #[arg(short, long)]
    cert: Option<String>,

    /// Path to TLS private key (PEM format)
    #[arg(short, long)]
    key: Option<String>,

    /// Sender name for system messages
    #[arg(long, default_value = "chatBot")]
    bot_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    if args.cert.is_none() || args.key.is_none() {
        tracing::warn!("no TLS certificate provided, using self-signed certificate");
    }

    let config = ServerRuntimeConfig {
        bind_address: socket_address(&args.host, args.port),
        cert_path: args.cert,
        key_path: args.key,
        router: RouterConfig { bot_name: args.bot_name, welcome_text: WELCOME_TEXT.to_string() },
    };

    let server = Server::bind(config)?;

    tracing::info!("Server is running on port {}", server.local_addr()?.port());

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}
