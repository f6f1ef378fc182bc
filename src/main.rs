// src/main.rs

//! # chain-sieve
//!
//! Runs a chained extraction over delimited text files:
//!
//! 1.  **Normalizing**: quote-like characters in every stage input are
//!     rewritten as `"` in place, unless disabled.
//! 2.  **Seeding**: the codes of interest are read from the reference file's
//!     key column.
//! 3.  **Extracting**: each stage keeps the records whose key column holds one
//!     of the current codes and writes them to its output file. Fields the
//!     stage harvests from those records become the codes of the next stage.
//!
//! Configuration is a JSON (or YAML) file; see `config::pipeline`.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use ChainSieve::config::cli::Args;
use ChainSieve::config::load_extraction_config;
use ChainSieve::executor::PipelineExecutor;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")); // Default to info if RUST_LOG is not set
    if args.log_json {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        fmt::Subscriber::builder().with_env_filter(filter).init();
    }

    info!("Loading extraction config from {}", args.config.display());
    let config = load_extraction_config(&args.config)
        .with_context(|| format!("invalid extraction config '{}'", args.config.display()))?;

    if args.validate_config {
        info!(
            stages = config.stages.len(),
            "Extraction configuration is valid"
        );
        return Ok(());
    }

    let normalize = config.preprocess_files && !args.skip_normalize;
    let executor = PipelineExecutor::new(config)
        .with_normalization(normalize)
        .with_progress(!args.no_progress);

    let summary = match executor.run() {
        Ok(summary) => summary,
        Err(e) => {
            error!("Extraction failed: {}", e);
            return Err(e).context("extraction pipeline aborted");
        }
    };

    info!("Codes of interest: {}", summary.seed_codes);
    for report in &summary.stages {
        info!(
            "{}: kept {} of {} records -> {}",
            report.stage_name,
            report.records_written,
            report.records_read,
            report.output.display()
        );
    }
    Ok(())
}
