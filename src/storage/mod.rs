//! Storage module for persisting crawl results
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Product persistence keyed by product URL
//! - Run tracking with final counters

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteSink;
pub use traits::{ProductSink, StorageError, StorageResult, UpsertOutcome};

use crate::state::RunSummary;
use std::path::Path;

/// Opens or creates the product database
pub fn open_sink(path: &Path) -> StorageResult<SqliteSink> {
    SqliteSink::open(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub summary: RunSummary,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}
