use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::DelimitedFormat;
use crate::data_model::{FieldSchema, Record};
use crate::error::{PipelineError, Result};
use crate::pipeline::writers::BaseWriter;

/// Writes records as delimited lines.
///
/// A value without the quote character is wrapped in quotes. A value that
/// already contains it is written verbatim, with no escaping, so such lines
/// do not read back unambiguously. Fields missing from a record are written
/// as empty values.
pub struct DelimitedWriter<W: Write> {
    sink: W,
    schema: Arc<FieldSchema>,
    delimiter: char,
    quote_char: char,
    origin: Option<PathBuf>,
    line: String,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(sink: W, schema: Arc<FieldSchema>, format: DelimitedFormat) -> Self {
        DelimitedWriter {
            sink,
            schema,
            delimiter: format.delimiter,
            quote_char: format.quote_char,
            origin: None,
            line: String::new(),
        }
    }

    /// Flushes and hands back the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.sink.flush().map_err(|e| self.write_error(e))?;
        Ok(self.sink)
    }

    fn format_into(&mut self, record: &Record) {
        self.line.clear();
        for (pos, name) in self.schema.names().iter().enumerate() {
            if pos > 0 {
                self.line.push(self.delimiter);
            }
            let value = record.get(name).unwrap_or_default();
            if value.contains(self.quote_char) {
                self.line.push_str(value);
            } else {
                self.line.push(self.quote_char);
                self.line.push_str(value);
                self.line.push(self.quote_char);
            }
        }
        self.line.push('\n');
    }

    fn flush_line(&mut self) -> Result<()> {
        if let Err(e) = self.sink.write_all(self.line.as_bytes()) {
            return Err(self.write_error(e));
        }
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> PipelineError {
        match &self.origin {
            Some(path) => PipelineError::file(path.clone(), source),
            None => PipelineError::IoError { source },
        }
    }
}

impl DelimitedWriter<BufWriter<File>> {
    /// Creates (or truncates) `path` for writing.
    pub fn create<P: AsRef<Path>>(
        path: P,
        schema: Arc<FieldSchema>,
        format: DelimitedFormat,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| PipelineError::file(path, e))?;
        let mut writer = Self::new(BufWriter::new(file), schema, format);
        writer.origin = Some(path.to_path_buf());
        Ok(writer)
    }
}

impl<W: Write> BaseWriter for DelimitedWriter<W> {
    fn write_header(&mut self) -> Result<()> {
        let header = Record::header(Arc::clone(&self.schema));
        self.write_record(&header)
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        self.format_into(record);
        self.flush_line()
    }

    fn close(self) -> Result<()> {
        self.into_inner().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> Arc<FieldSchema> {
        Arc::new(FieldSchema::new(
            names.iter().map(|s| s.to_string()).collect(),
        ))
    }

    fn render(schema: Arc<FieldSchema>, rows: &[Vec<&str>]) -> String {
        let mut writer = DelimitedWriter::new(Vec::new(), schema.clone(), DelimitedFormat::default());
        writer.write_header().unwrap();
        for row in rows {
            let record = Record::new(schema.clone(), row.iter().map(|s| s.to_string()).collect());
            writer.write_record(&record).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_header_and_rows_are_quoted() {
        let out = render(schema(&["id", "name"]), &[vec!["1", "alice"]]);
        assert_eq!(out, "\"id\",\"name\"\n\"1\",\"alice\"\n");
    }

    #[test]
    fn test_value_containing_quote_is_written_verbatim() {
        let out = render(schema(&["id", "note"]), &[vec!["7", "say \"hi\""]]);
        assert_eq!(out.lines().nth(1), Some("\"7\",say \"hi\""));
    }

    #[test]
    fn test_absent_field_is_written_empty() {
        let out = render(schema(&["id", "name"]), &[vec!["1"]]);
        assert_eq!(out.lines().nth(1), Some("\"1\",\"\""));
    }

    #[test]
    fn test_empty_value_is_quoted() {
        let out = render(schema(&["a", "b"]), &[vec!["", "x"]]);
        assert_eq!(out.lines().nth(1), Some("\"\",\"x\""));
    }

    #[test]
    fn test_custom_format() {
        let format = DelimitedFormat {
            delimiter: '|',
            quote_char: '\'',
        };
        let s = schema(&["a", "b"]);
        let mut writer = DelimitedWriter::new(Vec::new(), s.clone(), format);
        writer
            .write_record(&Record::new(s, vec!["x".into(), "it's".into()]))
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "'x'|it's\n");
    }
}
