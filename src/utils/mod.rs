// Utils

pub mod progress;

pub use progress::stage_spinner;
