//! Output module for reporting on stored crawl results
//!
//! This module handles:
//! - Loading and printing statistics from the product database
//! - Exporting stored products as JSON lines

pub mod export;
pub mod stats;

pub use export::{export_products, write_json_lines};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
