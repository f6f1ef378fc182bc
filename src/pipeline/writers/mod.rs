// Declare the delimited_writer module
pub mod base_writer;
pub mod delimited_writer;

pub use base_writer::BaseWriter;
pub use delimited_writer::DelimitedWriter;
