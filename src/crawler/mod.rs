//! Crawler module for category traversal and product extraction
//!
//! This module contains the core crawling logic, including:
//! - Category sequencing and listing page pagination
//! - Listing page parsing and product link dedup
//! - Bounded retries of listing and product renders
//! - Product page extraction
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod pagination;
mod parser;
mod request;
mod retry;
mod sequencer;

pub use coordinator::Coordinator;
pub use extractor::{
    scanned_price, structured_price, Extractor, PriceStrategy, ProductContext, ProductRecord,
    Rejection, RenderedPage, PRICE_STRATEGIES,
};
pub use pagination::{ListingStep, PaginationController};
pub use parser::{ListingPage, ListingParser};
pub use request::{PendingRequest, RequestContext, RequestKind};
pub use retry::{should_retry, RetryPolicy, DEFAULT_MAX_RETRIES};
pub use sequencer::{Category, CategorySequencer};

use crate::config::Config;
use crate::render::SplashRenderer;
use crate::state::RunSummary;
use crate::storage::open_sink;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the product database and record a new run
/// 2. Build the render client
/// 3. Walk every eligible category page by page
/// 4. Render, extract and store discovered products
/// 5. Record the run summary
pub async fn crawl(config: Config, config_hash: &str) -> Result<RunSummary> {
    let renderer = SplashRenderer::new(&config.renderer, &config.user_agent)?;
    let sink = open_sink(Path::new(&config.output.database_path))?;

    let coordinator = Coordinator::new(&config, Arc::new(renderer), sink, config_hash)?;
    coordinator.run().await
}
