//! `veritas-proxy` binary entrypoint.
//!
//! Loads configuration (defaults, then `--config` file, then flags) and starts
//! the Actix server.

use clap::Parser;
use std::path::PathBuf;
use veritas_proxy::{serve, CryptoFeed, ProxyConfig, RouteTable};

#[derive(Parser)]
#[command(name = "veritas-proxy")]
#[command(version, about = "HTTP proxy for the Veritas client", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Path to a veritas.yml file
    #[arg(short, long, env = "VERITAS_CONFIG")]
    config: Option<PathBuf>,

    /// Provider set for /api/trending/crypto (coincap, lunar_gecko)
    #[arg(long, env = "VERITAS_CRYPTO_FEED")]
    crypto_feed: Option<CryptoFeed>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Respect `RUST_LOG` if set; otherwise default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ProxyConfig::from_yaml_file(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(feed) = cli.crypto_feed {
        config.crypto_feed = feed;
    }

    serve(config, RouteTable::standard()).await
}
