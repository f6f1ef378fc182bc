use std::path::PathBuf;
use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The Error type for extraction pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("I/O error on '{}': {source}", .path.display())]
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    // The previous stage harvested, but not the column this stage filters on.
    #[error(
        "Stage '{stage}' filters on '{key_column}', which the previous stage did not harvest (harvested: {})",
        .available.join(", ")
    )]
    MissingHarvestKey {
        stage: String,
        key_column: String,
        available: Vec<String>,
    },

    #[error("Error in stage '{stage_name}': {source}")]
    StageError {
        stage_name: String,
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Wraps an `std::io::Error` with the path it happened on.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::FileError {
            path: path.into(),
            source,
        }
    }
}
