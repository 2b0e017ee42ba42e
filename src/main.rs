//! Anki MCP Server - Entry point
//!
//! Serves AnkiConnect tools and resources over stdio.

use std::path::PathBuf;
use std::time::Duration;

use anki_mcp_server::{run_server_with_config, ServerConfig};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// MCP server for managing Anki through AnkiConnect.
#[derive(Parser, Debug)]
#[command(name = "anki-mcp-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// AnkiConnect port on localhost.
    #[arg(long, env = "ANKI_CONNECT_PORT", default_value_t = anki_mcp_server::anki::DEFAULT_PORT,
          value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Default output directory for converted Docling documents.
    #[arg(long, env = "ANKI_MCP_INTERMEDIATE_DIR", default_value = "data/input/intermediate/")]
    intermediate_dir: PathBuf,

    /// Lifetime of cached note type resources, in seconds.
    #[arg(long, default_value_t = 300)]
    cache_ttl_secs: u64,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn parse_log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            other => anyhow::bail!("invalid log level: {}", other),
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            anki_connect_url: anki_mcp_server::anki::local_url(self.port),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            intermediate_dir: self.intermediate_dir.clone(),
            ..ServerConfig::default()
        }
    }
}

fn init_tracing(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("anki_mcp_server={}", level)));

    // stdout carries the MCP protocol
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.parse_log_level()?)?;

    tracing::info!(port = args.port, "Starting Anki MCP Server");

    run_server_with_config(args.server_config()).await
}
