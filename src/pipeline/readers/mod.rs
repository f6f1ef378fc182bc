// src/pipeline/readers/mod.rs

pub mod base_reader;
pub mod delimited_reader;

pub use base_reader::BaseReader;
pub use delimited_reader::DelimitedReader;
