use std::path::PathBuf;

use clap::Parser;

// Define command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the extraction configuration file (JSON, or YAML by extension).
    #[arg(short = 'c', long, default_value = "extraction_info.json")]
    pub config: PathBuf,

    /// Do not rewrite quote characters in the stage input files, whatever the config says.
    #[arg(long)]
    pub skip_normalize: bool,

    /// Validate the extraction configuration and exit
    #[arg(long)]
    pub validate_config: bool,

    /// Hide the per-stage progress spinners
    #[arg(long)]
    pub no_progress: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}
