// src/config/mod.rs

pub mod cli;
pub mod pipeline;

pub use pipeline::{
    load_extraction_config, DelimitedFormat, ExtractionConfig, SeedConfig, StageConfig,
};
