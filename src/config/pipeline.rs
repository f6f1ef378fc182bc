use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs; // For reading the file
use std::path::{Path, PathBuf};

/// The overall extraction configuration, read from JSON or YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ExtractionConfig {
    /// The reference file holding the codes of interest.
    #[serde(rename = "main", alias = "seed")]
    pub seed: SeedConfig,

    /// Stages in execution order.
    #[serde(rename = "extraction_info", alias = "stages")]
    pub stages: Vec<StageConfig>,

    /// Rewrite quote-like characters in every stage input before parsing.
    #[serde(default = "default_true")]
    pub preprocess_files: bool,

    #[serde(default)]
    pub format: DelimitedFormat,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SeedConfig {
    #[serde(alias = "reference_file")]
    pub sample_file: PathBuf,
    pub key_column: String,
}

/// One extraction stage: filter `input` on `key_column`, write to `output`.
#[derive(Deserialize, Debug, Clone)]
pub struct StageConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub key_column: String,
    #[serde(default, rename = "relevant_keys", alias = "harvest_fields")]
    pub harvest_fields: Option<Vec<String>>,
}

impl StageConfig {
    /// Name used in logs and errors: the configured name, or the input file stem.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.input.display().to_string()),
        }
    }

    /// Checks the paths, key column and harvest names of this stage on its own.
    pub fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() || self.output.as_os_str().is_empty() {
            return Err(PipelineError::ConfigValidationError(format!(
                "Stage '{}': input and output paths must not be empty",
                self.display_name()
            )));
        }
        // The output is truncated while the input is still being read.
        if self.input == self.output {
            return Err(PipelineError::ConfigValidationError(format!(
                "Stage '{}': output must not overwrite its own input '{}'",
                self.display_name(),
                self.input.display()
            )));
        }
        if self.key_column.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(format!(
                "Stage '{}': key_column must not be empty",
                self.display_name()
            )));
        }
        if let Some(fields) = &self.harvest_fields {
            if let Some(pos) = fields.iter().position(|f| f.trim().is_empty()) {
                return Err(PipelineError::ConfigValidationError(format!(
                    "Stage '{}': relevant_keys entry {} must not be empty",
                    self.display_name(),
                    pos
                )));
            }
        }
        Ok(())
    }

    /// Declared harvest fields. An empty list counts as none.
    pub fn harvest(&self) -> Option<&[String]> {
        self.harvest_fields
            .as_deref()
            .filter(|fields| !fields.is_empty())
    }
}

/// Delimiter and quote character shared by every file in a run.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedFormat {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_quote_char")]
    pub quote_char: char,
}

impl Default for DelimitedFormat {
    fn default() -> Self {
        DelimitedFormat {
            delimiter: default_delimiter(),
            quote_char: default_quote_char(),
        }
    }
}

impl DelimitedFormat {
    pub fn validate(&self) -> Result<()> {
        if self.delimiter == self.quote_char {
            return Err(PipelineError::ConfigValidationError(format!(
                "DelimitedFormat: delimiter and quote_char must differ, both are {:?}",
                self.delimiter
            )));
        }
        for (name, c) in [("delimiter", self.delimiter), ("quote_char", self.quote_char)] {
            if c == '\n' || c == '\r' {
                return Err(PipelineError::ConfigValidationError(format!(
                    "DelimitedFormat: {} must not be a line terminator",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

fn default_quote_char() -> char {
    '"'
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        self.format.validate()?;

        if self.seed.key_column.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "main: key_column must not be empty".to_string(),
            ));
        }
        if self.seed.sample_file.as_os_str().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "main: sample_file must not be empty".to_string(),
            ));
        }
        if self.stages.is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "extraction_info must list at least one stage".to_string(),
            ));
        }

        for stage in &self.stages {
            stage.validate()?;
        }

        // The membership set of each stage comes from the previous stage's
        // harvest whenever that stage declares one.
        for pair in self.stages.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if let Some(harvested) = previous.harvest() {
                if !harvested.contains(&current.key_column) {
                    return Err(PipelineError::ConfigValidationError(format!(
                        "Stage '{}' filters on '{}' but stage '{}' only harvests [{}]",
                        current.display_name(),
                        current.key_column,
                        previous.display_name(),
                        harvested.join(", ")
                    )));
                }
            }
        }
        Ok(())
    }

    /// Input files of every stage, in stage order, without repeats.
    pub fn stage_inputs(&self) -> Vec<&Path> {
        let mut inputs: Vec<&Path> = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            if !inputs.contains(&stage.input.as_path()) {
                inputs.push(stage.input.as_path());
            }
        }
        inputs
    }
}

/// Loads, parses and validates an extraction configuration file.
///
/// Files ending in `.yaml`/`.yml` are parsed as YAML, everything else as JSON.
pub fn load_extraction_config<P: AsRef<Path>>(config_path: P) -> Result<ExtractionConfig> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read extraction config file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    let is_yaml = matches!(
        path_ref.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    let config: ExtractionConfig = if is_yaml {
        serde_yaml::from_str(&config_content).map_err(|e| {
            PipelineError::ConfigError(format!(
                "Failed to parse extraction config YAML from '{}': {}",
                path_ref.display(),
                e
            ))
        })?
    } else {
        serde_json::from_str(&config_content).map_err(|e| {
            PipelineError::ConfigError(format!(
                "Failed to parse extraction config JSON from '{}': {}",
                path_ref.display(),
                e
            ))
        })?
    };

    config.validate()?;

    Ok(config)
}
