use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::{DelimitedFormat, ExtractionConfig, StageConfig};
use crate::data_model::{HarvestMap, MembershipSet};
use crate::error::{PipelineError, Result};
use crate::pipeline::extraction::{ExtractionStage, StageReport};
use crate::pipeline::normalize::normalize_files;
use crate::pipeline::readers::DelimitedReader;

/// Reads the codes of interest: the values of `key_column` across every
/// record of `path`. Records without the column contribute nothing.
pub fn read_codes<P: AsRef<Path>>(
    path: P,
    key_column: &str,
    format: DelimitedFormat,
) -> Result<MembershipSet> {
    let path = path.as_ref();
    let mut codes = MembershipSet::new();
    for record in DelimitedReader::open(path, format)? {
        if let Some(code) = record?.get(key_column) {
            codes.insert(code);
        }
    }
    if codes.is_empty() {
        warn!(
            file = %path.display(),
            key_column,
            "No codes of interest found in the reference file"
        );
    }
    Ok(codes)
}

/// Membership set for `stage`, given the set the previous stage filtered on
/// and what that stage harvested.
///
/// No harvest carries the current set forward. A harvest that lacks the
/// stage's key column is a configuration fault.
pub fn next_membership(
    current: MembershipSet,
    previous_harvest: Option<&HarvestMap>,
    stage: &StageConfig,
) -> Result<MembershipSet> {
    let Some(harvest) = previous_harvest else {
        debug!(
            stage = %stage.display_name(),
            codes = current.len(),
            "Carrying membership set forward"
        );
        return Ok(current);
    };

    let next = harvest.membership_for(&stage.key_column).ok_or_else(|| {
        PipelineError::MissingHarvestKey {
            stage: stage.display_name(),
            key_column: stage.key_column.clone(),
            available: harvest.field_names(),
        }
    })?;
    debug!(
        stage = %stage.display_name(),
        key_column = %stage.key_column,
        codes = next.len(),
        "Membership set replaced by previous harvest"
    );
    if next.is_empty() {
        warn!(
            stage = %stage.display_name(),
            key_column = %stage.key_column,
            "Previous stage harvested no values; this stage will match nothing"
        );
    }
    Ok(next)
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub seed_codes: usize,
    pub stages: Vec<StageReport>,
}

/// Runs the configured stages in order, each filtered by what the previous
/// one harvested.
pub struct PipelineExecutor {
    config: ExtractionConfig,
    normalize: bool,
    show_progress: bool,
}

impl PipelineExecutor {
    pub fn new(config: ExtractionConfig) -> Self {
        let normalize = config.preprocess_files;
        PipelineExecutor {
            config,
            normalize,
            show_progress: false,
        }
    }

    /// Overrides the config's `preprocess_files` setting.
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Normalizes the stage inputs, reads the seed codes and folds the
    /// membership set through every stage. The first failure aborts the run;
    /// outputs of stages that already finished stay on disk.
    ///
    /// The format and every stage are checked before any file is touched.
    /// The harvest chain is checked as the fold reaches each stage.
    pub fn run(&self) -> Result<PipelineSummary> {
        let format = self.config.format;
        format.validate()?;
        for stage in &self.config.stages {
            stage.validate()?;
        }

        if self.normalize {
            normalize_files(self.config.stage_inputs().as_slice())?;
        } else {
            debug!("Quote normalization skipped");
        }

        let seed = &self.config.seed;
        let seed_codes = read_codes(&seed.sample_file, &seed.key_column, format)?;
        info!(
            file = %seed.sample_file.display(),
            key_column = %seed.key_column,
            codes = seed_codes.len(),
            "Loaded codes of interest"
        );

        let seed_count = seed_codes.len();

        // (membership set, previous stage's harvest, reports so far)
        let initial: (MembershipSet, Option<HarvestMap>, Vec<StageReport>) =
            (seed_codes, None, Vec::with_capacity(self.config.stages.len()));
        let (_, _, reports) = self.config.stages.iter().try_fold(
            initial,
            |(membership, previous_harvest, mut reports), stage| -> Result<_> {
                let stage_name = stage.display_name();
                let wrap = |source: PipelineError| PipelineError::StageError {
                    stage_name: stage_name.clone(),
                    source: Box::new(source),
                };

                let membership = next_membership(membership, previous_harvest.as_ref(), stage)
                    .map_err(wrap)?;
                let report = ExtractionStage::new(stage, format)
                    .with_progress(self.show_progress)
                    .run(&membership)
                    .map_err(wrap)?;

                let harvest = report.harvest.clone();
                reports.push(report);
                Ok((membership, harvest, reports))
            },
        )?;

        Ok(PipelineSummary {
            seed_codes: seed_count,
            stages: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::{FieldSchema, Record};
    use std::sync::Arc;

    fn stage(key: &str) -> StageConfig {
        StageConfig {
            name: Some("items".into()),
            input: "items.csv".into(),
            output: "items_out.csv".into(),
            key_column: key.to_string(),
            harvest_fields: None,
        }
    }

    fn harvest_of(field: &str, values: &[&str]) -> HarvestMap {
        let schema = Arc::new(FieldSchema::new(vec![field.to_string()]));
        let mut harvest = HarvestMap::new(&[field]);
        for value in values {
            harvest.collect_from(&Record::new(schema.clone(), vec![value.to_string()]));
        }
        harvest
    }

    #[test]
    fn test_no_harvest_carries_set_forward() {
        let current: MembershipSet = ["a", "b"].into_iter().collect();
        let next = next_membership(current.clone(), None, &stage("id")).unwrap();
        assert_eq!(next, current);
    }

    #[test]
    fn test_harvest_replaces_set() {
        let current: MembershipSet = ["a"].into_iter().collect();
        let harvest = harvest_of("order_id", &["o1", "o2", "o1"]);
        let next = next_membership(current, Some(&harvest), &stage("order_id")).unwrap();
        let expected: MembershipSet = ["o1", "o2"].into_iter().collect();
        assert_eq!(next, expected);
    }

    #[test]
    fn test_empty_harvest_gives_empty_set() {
        let harvest = harvest_of("order_id", &[]);
        let next = next_membership(MembershipSet::new(), Some(&harvest), &stage("order_id")).unwrap();
        assert!(next.is_empty());
    }

    #[test]
    fn test_missing_key_in_harvest_is_config_fault() {
        let harvest = harvest_of("order_id", &["o1"]);
        match next_membership(MembershipSet::new(), Some(&harvest), &stage("region")) {
            Err(PipelineError::MissingHarvestKey {
                stage,
                key_column,
                available,
            }) => {
                assert_eq!(stage, "items");
                assert_eq!(key_column, "region");
                assert_eq!(available, vec!["order_id".to_string()]);
            }
            other => panic!("Expected MissingHarvestKey, got {:?}", other),
        }
    }
}
