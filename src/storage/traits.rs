//! Sink trait and error types
//!
//! This module defines the interface the crawl core writes products through
//! and the associated error types.

use crate::crawler::ProductRecord;
use crate::state::RunSummary;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What an upsert did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The record was stored
    Inserted,

    /// A record with the same product URL already existed and was kept
    DuplicateSkipped,
}

/// Durable destination for product records
///
/// A sink is opened once before the first request of a run and closed once
/// at its end. Upserts are keyed by `product_url`; the first stored record
/// for a URL is never overwritten.
pub trait ProductSink {
    /// Records the start of a run and returns its ID
    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Stores a record unless its product URL is already present
    fn upsert(&mut self, record: &ProductRecord) -> StorageResult<UpsertOutcome>;

    /// Records the final counters of a run
    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()>;

    /// Flushes and releases the sink
    fn close(self) -> StorageResult<()>
    where
        Self: Sized;
}
