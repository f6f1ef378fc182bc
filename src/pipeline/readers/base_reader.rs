use crate::data_model::{FieldSchema, Record};
use crate::error::Result;

/// A forward-only source of records sharing one schema.
pub trait BaseReader {
    fn schema(&self) -> &FieldSchema;

    /// Returns the next record, or `None` once the source is exhausted.
    fn next_record(&mut self) -> Result<Option<Record>>;
}
