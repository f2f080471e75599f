//! Utility modules shared by the pipeline stages.

pub mod date;
pub mod fs;
pub mod git;
