//! Run-scoped crawl state
//!
//! Everything a crawl mutates while it runs lives here and is owned by one
//! run, so independent runs (and tests) never share state.
//!
//! # Components
//!
//! - `CrawlCursor`: the single category/page position of the listing chain
//! - `SeenProductSet`: product URLs already dispatched for rendering
//! - `RunStats`: counters for the run summary

mod cursor;
mod seen;
mod stats;

// Re-export main types
pub use cursor::CrawlCursor;
pub use seen::SeenProductSet;
pub use stats::{RunStats, RunSummary};
