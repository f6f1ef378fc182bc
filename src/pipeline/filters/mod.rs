// src/pipeline/filters/mod.rs

mod membership_filter;

// Re-export the main type
pub use membership_filter::{MembershipFilter, RecordFilter};
