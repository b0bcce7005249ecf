pub mod config;
pub mod dataset;
pub mod dvc;
pub mod error;
pub mod git;
pub mod metadata;
pub mod pipeline;
pub mod storage;
pub mod workflow;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
