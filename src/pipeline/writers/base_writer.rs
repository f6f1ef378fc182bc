use crate::data_model::Record;
use crate::error::Result;

/// Trait for writing records to an output sink (e.g. file).
pub trait BaseWriter {
    /// Write the header row: every field's value is its own name.
    fn write_header(&mut self) -> Result<()>;

    /// Write a single record in schema order.
    fn write_record(&mut self, record: &Record) -> Result<()>;

    /// Flush and close the output writer.
    fn close(self) -> Result<()>;
}
