// src/pipeline/mod.rs

pub mod extraction;
pub mod filters;
pub mod normalize;
pub mod readers;
pub mod writers;
