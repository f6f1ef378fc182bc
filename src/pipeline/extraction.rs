// src/pipeline/extraction.rs

use std::path::PathBuf;

use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::config::{DelimitedFormat, StageConfig};
use crate::data_model::{HarvestMap, MembershipSet};
use crate::error::Result;
use crate::pipeline::filters::{MembershipFilter, RecordFilter};
use crate::pipeline::readers::{BaseReader, DelimitedReader};
use crate::pipeline::writers::{BaseWriter, DelimitedWriter};
use crate::utils::stage_spinner;

/// Counts and harvested values from one pass over a record stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub records_read: usize,
    pub records_written: usize,
    pub harvest: Option<HarvestMap>,
}

/// What a finished stage hands back to the executor.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage_name: String,
    pub output: PathBuf,
    pub records_read: usize,
    pub records_written: usize,
    /// `None` when the stage declares no harvest fields.
    pub harvest: Option<HarvestMap>,
}

/// Writes the header, then every record the filter keeps, collecting the
/// declared harvest fields from those records along the way.
pub fn filter_records<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    filter: &F,
    harvest_fields: Option<&[String]>,
    progress: &ProgressBar,
) -> Result<FilterOutcome>
where
    R: BaseReader,
    W: BaseWriter,
    F: RecordFilter,
{
    writer.write_header()?;

    let mut harvest = harvest_fields.map(HarvestMap::new);
    let mut outcome = FilterOutcome::default();

    while let Some(record) = reader.next_record()? {
        outcome.records_read += 1;
        progress.inc(1);

        if !filter.keep(&record) {
            continue;
        }
        if let Some(harvest) = harvest.as_mut() {
            harvest.collect_from(&record);
        }
        writer.write_record(&record)?;
        outcome.records_written += 1;
    }

    outcome.harvest = harvest;
    Ok(outcome)
}

/// One filter-and-harvest pass over a single input file.
pub struct ExtractionStage<'a> {
    config: &'a StageConfig,
    format: DelimitedFormat,
    show_progress: bool,
}

impl<'a> ExtractionStage<'a> {
    pub fn new(config: &'a StageConfig, format: DelimitedFormat) -> Self {
        ExtractionStage {
            config,
            format,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Filters the input against `codes` and writes the survivors to the
    /// output file, which is created or truncated.
    pub fn run(&self, codes: &MembershipSet) -> Result<StageReport> {
        self.config.validate()?;
        let stage_name = self.config.display_name();
        let key_column = self.config.key_column.as_str();
        let harvest_fields = self.config.harvest();

        info!(
            stage = %stage_name,
            input = %self.config.input.display(),
            key_column,
            codes = codes.len(),
            "Starting extraction stage"
        );

        let mut reader = DelimitedReader::open(&self.config.input, self.format)?;
        if !reader.schema().contains(key_column) {
            warn!(
                stage = %stage_name,
                key_column,
                "Key column is not in the input header; no record will match"
            );
        }
        let mut writer =
            DelimitedWriter::create(&self.config.output, reader.shared_schema(), self.format)?;

        let filter = MembershipFilter::new(key_column, codes);
        let progress = stage_spinner(self.show_progress, &stage_name);
        let outcome = filter_records(
            &mut reader,
            &mut writer,
            &filter,
            harvest_fields,
            &progress,
        )?;
        writer.close()?;

        progress.finish_with_message(format!(
            "{}: {} of {} records kept",
            stage_name, outcome.records_written, outcome.records_read
        ));
        info!(
            stage = %stage_name,
            filter = filter.name(),
            output = %self.config.output.display(),
            records_read = outcome.records_read,
            records_written = outcome.records_written,
            harvested = outcome.harvest.as_ref().map_or(0, HarvestMap::total_values),
            "Finished extraction stage"
        );

        Ok(StageReport {
            stage_name,
            output: self.config.output.clone(),
            records_read: outcome.records_read,
            records_written: outcome.records_written,
            harvest: outcome.harvest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::FieldSchema;
    use std::io::Cursor;

    fn run_in_memory(input: &str, key: &str, codes: &[&str], harvest: Option<&[&str]>) -> (String, FilterOutcome) {
        let mut reader =
            DelimitedReader::with_header(Cursor::new(input.as_bytes().to_vec()), DelimitedFormat::default())
                .unwrap();
        let mut writer = DelimitedWriter::new(Vec::new(), reader.shared_schema(), DelimitedFormat::default());
        let codes: MembershipSet = codes.iter().copied().collect();
        let filter = MembershipFilter::new(key, &codes);
        let harvest: Option<Vec<String>> = harvest.map(|h| h.iter().map(|s| s.to_string()).collect());
        let outcome = filter_records(
            &mut reader,
            &mut writer,
            &filter,
            harvest.as_deref(),
            &ProgressBar::hidden(),
        )
        .unwrap();
        (String::from_utf8(writer.into_inner().unwrap()).unwrap(), outcome)
    }

    #[test]
    fn test_keeps_matching_records_in_order() {
        let (out, outcome) = run_in_memory("id,name\n3,carol\n1,alice\n2,bob\n", "id", &["1", "3"], None);
        assert_eq!(out, "\"id\",\"name\"\n\"3\",\"carol\"\n\"1\",\"alice\"\n");
        assert_eq!(outcome.records_read, 3);
        assert_eq!(outcome.records_written, 2);
        assert!(outcome.harvest.is_none());
    }

    #[test]
    fn test_harvest_only_from_matching_records() {
        let input = "id,region\n1,north\n2,east\n3,north\n4,south\n";
        let (_, outcome) = run_in_memory(input, "id", &["1", "3", "4"], Some(&["region"]));
        let harvest = outcome.harvest.unwrap();
        assert_eq!(harvest.get("region").unwrap(), &["north", "north", "south"]);
    }

    #[test]
    fn test_harvest_declared_but_nothing_matches() {
        let (out, outcome) = run_in_memory("id,region\n1,north\n", "id", &["9"], Some(&["region"]));
        assert_eq!(out, "\"id\",\"region\"\n");
        let harvest = outcome.harvest.unwrap();
        assert!(harvest.get("region").unwrap().is_empty());
    }

    #[test]
    fn test_header_only_input() {
        let (out, outcome) = run_in_memory("id,name\n", "id", &["1"], None);
        assert_eq!(out, "\"id\",\"name\"\n");
        assert_eq!(outcome.records_read, 0);
    }

    #[test]
    fn test_header_schema_is_shared_with_writer() {
        let reader =
            DelimitedReader::with_header(Cursor::new(b"a,b\n".to_vec()), DelimitedFormat::default())
                .unwrap();
        let schema: &FieldSchema = reader.schema();
        assert_eq!(schema.names(), &["a", "b"]);
    }
}
