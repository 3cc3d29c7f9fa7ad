//! txt2kg server binary

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use txt2kg_server::{config::ServerConfig, start_server, ServerError};

/// Knowledge-graph extraction server
#[derive(Parser, Debug)]
#[command(name = "txt2kg-server")]
#[command(about = "Extract knowledge graphs from text and serve them over HTTP", long_about = None)]
#[command(version)]
struct Args {
    /// TOML configuration file; defaults and environment variables apply without one
    #[arg(short, long, env = "TXT2KG_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref())?;
    start_server(config).await
}
