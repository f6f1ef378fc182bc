// src/pipeline/readers/delimited_reader.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::DelimitedFormat;
use crate::data_model::{FieldSchema, Record};
use crate::error::{PipelineError, Result};
use crate::pipeline::readers::BaseReader;

/// Reads one record per line from delimited text.
///
/// Splitting is not quote aware: a delimiter between quote characters still
/// separates two values. Lines shorter than the schema yield records with the
/// trailing fields absent, and surplus values are dropped.
#[derive(Debug)]
pub struct DelimitedReader<R> {
    source: R,
    schema: Arc<FieldSchema>,
    delimiter: char,
    quote_char: char,
    origin: Option<PathBuf>,
    line: String,
    exhausted: bool,
}

impl<R: BufRead> DelimitedReader<R> {
    /// Reader over `source` whose lines are all data lines.
    pub fn new(source: R, schema: FieldSchema, format: DelimitedFormat) -> Self {
        DelimitedReader {
            source,
            schema: Arc::new(schema),
            delimiter: format.delimiter,
            quote_char: format.quote_char,
            origin: None,
            line: String::new(),
            exhausted: false,
        }
    }

    /// Consumes the first line of `source` as the header. An empty source
    /// gives a schema with a single empty field name.
    pub fn with_header(mut source: R, format: DelimitedFormat) -> Result<Self> {
        let mut header = String::new();
        source.read_line(&mut header)?;
        let schema = FieldSchema::from_header(&header, format.delimiter);
        Ok(Self::new(source, schema, format))
    }

    pub fn quote_char(&self) -> char {
        self.quote_char
    }

    pub fn shared_schema(&self) -> Arc<FieldSchema> {
        Arc::clone(&self.schema)
    }

    fn parse_line(&self, raw: &str) -> Record {
        let values = strip_line_terminator(raw)
            .split(self.delimiter)
            .map(str::to_string)
            .collect();
        Record::new(Arc::clone(&self.schema), values)
    }

    fn read_error(&self, source: std::io::Error) -> PipelineError {
        match &self.origin {
            Some(path) => PipelineError::file(path.clone(), source),
            None => PipelineError::IoError { source },
        }
    }
}

impl DelimitedReader<BufReader<File>> {
    /// Opens `path` and reads its header line.
    pub fn open<P: AsRef<Path>>(path: P, format: DelimitedFormat) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PipelineError::file(path, e))?;
        let mut reader = Self::with_header(BufReader::new(file), format).map_err(|e| match e {
            PipelineError::IoError { source } => PipelineError::file(path, source),
            other => other,
        })?;
        reader.origin = Some(path.to_path_buf());
        Ok(reader)
    }
}

impl<R: BufRead> BaseReader for DelimitedReader<R> {
    fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        if self.exhausted {
            return Ok(None);
        }
        self.line.clear();
        let read = match self.source.read_line(&mut self.line) {
            Ok(read) => read,
            Err(e) => {
                self.exhausted = true;
                return Err(self.read_error(e));
            }
        };
        if read == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        Ok(Some(self.parse_line(&self.line)))
    }
}

impl<R: BufRead> Iterator for DelimitedReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Strips one trailing `\n` and a `\r` before it.
fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> DelimitedReader<Cursor<Vec<u8>>> {
        DelimitedReader::with_header(
            Cursor::new(text.as_bytes().to_vec()),
            DelimitedFormat::default(),
        )
        .expect("header should parse")
    }

    #[test]
    fn test_reads_records_in_order() {
        let records: Vec<Record> = reader("id,name\n1,alice\n2,bob\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("alice"));
        assert_eq!(records[1].get("id"), Some("2"));
    }

    #[test]
    fn test_last_line_without_terminator() {
        let records: Vec<Record> = reader("id,name\n1,alice").collect::<Result<_>>().unwrap();
        assert_eq!(records[0].get("name"), Some("alice"));
    }

    #[test]
    fn test_crlf_terminator_is_stripped() {
        let records: Vec<Record> = reader("id,name\r\n1,alice\r\n").collect::<Result<_>>().unwrap();
        assert_eq!(records[0].get("name"), Some("alice"));
    }

    #[test]
    fn test_short_line_leaves_fields_absent() {
        let records: Vec<Record> = reader("id,name\n1\n").collect::<Result<_>>().unwrap();
        assert_eq!(records[0].get("id"), Some("1"));
        assert_eq!(records[0].get("name"), None);
    }

    #[test]
    fn test_delimiter_inside_quotes_still_splits() {
        let records: Vec<Record> = reader("id,name\n1,\"Smith, John\"\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records[0].get("name"), Some("\"Smith"));
        assert_eq!(records[0].present_len(), 2);
    }

    #[test]
    fn test_exhausted_reader_stays_exhausted() {
        let mut r = reader("id\n1\n");
        assert!(r.next_record().unwrap().is_some());
        assert!(r.next_record().unwrap().is_none());
        assert!(r.next_record().unwrap().is_none());
        assert!(r.next().is_none());
    }

    #[test]
    fn test_empty_source_has_single_empty_field() {
        let r = reader("");
        assert_eq!(r.schema().names(), &[String::new()]);
    }

    #[test]
    fn test_custom_delimiter() {
        let format = DelimitedFormat {
            delimiter: ';',
            quote_char: '\'',
        };
        let mut r = DelimitedReader::with_header(Cursor::new(b"a;b\nx;y,z\n".to_vec()), format)
            .unwrap();
        assert_eq!(r.quote_char(), '\'');
        let record = r.next_record().unwrap().unwrap();
        assert_eq!(record.get("b"), Some("y,z"));
    }

    #[test]
    fn test_open_missing_file_names_path() {
        let err = DelimitedReader::open("definitely/not/here.csv", DelimitedFormat::default())
            .unwrap_err();
        match err {
            PipelineError::FileError { path, .. } => {
                assert_eq!(path, PathBuf::from("definitely/not/here.csv"))
            }
            other => panic!("Expected FileError, got {:?}", other),
        }
    }
}
