//! Batch conversion of Docling layout JSON into hierarchical section documents.

use std::path::PathBuf;
use std::process::ExitCode;

use anki_mcp_server::docling::{require_inputs, DoclingConverter, DEFAULT_OUTPUT_DIR};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Convert *_docling.json files into structured section JSON.
#[derive(Parser, Debug)]
#[command(name = "docling-convert")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Docling JSON files or directories containing *_docling.json files.
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Directory receiving {name}.json outputs.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn init_tracing(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "anki_mcp_server={},docling_convert={}",
            level, level
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.log_level)?;

    let inputs = match require_inputs(&args.sources) {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::error!(error = %e, "nothing to convert");
            return Ok(ExitCode::FAILURE);
        }
    };

    tracing::info!(
        files = inputs.len(),
        output_dir = %args.output_dir.display(),
        "converting Docling documents"
    );

    let converter = DoclingConverter::new(&args.output_dir);
    let summary = converter.convert_all(&inputs);
    println!("{}", summary.report());

    Ok(ExitCode::SUCCESS)
}
