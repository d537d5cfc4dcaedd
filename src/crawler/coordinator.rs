//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs one crawl:
//! - A single listing chain walks categories and their pages in order,
//!   pausing before each listing request
//! - Product pages discovered on a listing page are rendered by spawned tasks
//!   that run alongside the listing chain
//! - Accepted products go to the sink; the run summary is recorded at the end

use crate::config::Config;
use crate::crawler::extractor::{Extractor, ProductContext, RenderedPage};
use crate::crawler::pagination::{ListingStep, PaginationController};
use crate::crawler::parser::ListingParser;
use crate::crawler::request::PendingRequest;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::sequencer::CategorySequencer;
use crate::render::{RenderOptions, RenderOutcome, Renderer};
use crate::state::{CrawlCursor, RunStats, RunSummary, SeenProductSet};
use crate::storage::{ProductSink, StorageError, UpsertOutcome};
use crate::Result;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};

/// Main crawler coordinator structure
pub struct Coordinator<S> {
    controller: PaginationController,
    cursor: Option<CrawlCursor>,
    worker: ProductWorker<S>,
    renderer: Arc<dyn Renderer>,
    options: RenderOptions,
    request_delay: Duration,
    stats: RunStats,
    run_id: i64,
}

impl<S> Coordinator<S>
where
    S: ProductSink + Send + 'static,
{
    /// Creates a coordinator and records the start of a run in the sink
    ///
    /// Fails before any request is issued if the extraction patterns do not
    /// compile, a category URL is unusable or the sink cannot start a run.
    pub fn new(
        config: &Config,
        renderer: Arc<dyn Renderer>,
        mut sink: S,
        config_hash: &str,
    ) -> Result<Self> {
        let stats = RunStats::new();
        let seen = SeenProductSet::new();

        let sequencer = CategorySequencer::from_config(&config.categories)?;
        let parser = ListingParser::new(&config.extraction)?;
        let extractor = Extractor::new(&config.extraction, config.crawler.max_images_per_product)?;
        let controller =
            PaginationController::new(sequencer, parser, &config.crawler, seen, stats.clone());

        let run_id = sink.begin_run(config_hash)?;
        let options = RenderOptions {
            wait_seconds: config.crawler.wait_seconds,
        };

        Ok(Self {
            controller,
            cursor: None,
            worker: ProductWorker {
                extractor: Arc::new(extractor),
                renderer: Arc::clone(&renderer),
                sink: Arc::new(Mutex::new(sink)),
                retry: RetryPolicy::new(config.crawler.max_retries),
                options,
                stats: stats.clone(),
            },
            renderer,
            options,
            request_delay: Duration::from_millis(config.crawler.request_delay_ms),
            stats,
            run_id,
        })
    }

    /// ID of the run recorded in the sink
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Runs the crawl to completion and returns its summary
    ///
    /// The listing chain ends when the last eligible category is finished;
    /// the run ends once every spawned product task has completed.
    pub async fn run(mut self) -> Result<RunSummary> {
        tracing::info!("Starting crawl run {}", self.run_id);
        let start_time = std::time::Instant::now();

        let mut tasks = JoinSet::new();
        let mut next = self.controller.start();
        if next.is_none() {
            tracing::warn!("Every configured category is skipped; nothing to crawl");
        }

        while let Some(request) = next.take() {
            self.track_cursor(&request);

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            let step = match self.process_listing(&request).await {
                Ok(step) => step,
                Err(e) => {
                    tracing::error!("Dropping listing chain at {}: {}", request.url, e);
                    self.after_malformed()
                }
            };

            for product in step.products {
                tasks.spawn(self.worker.clone().run(product));
            }
            next = step.next;

            while let Some(joined) = tasks.try_join_next() {
                log_join(joined);
            }
        }

        tracing::debug!("Listing chain finished; waiting for {} product task(s)", tasks.len());
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }

        let summary = self.stats.snapshot();
        tracing::info!(
            "Crawl completed in {:?}: {} product(s) stored, {} rejected, {} duplicate(s), {} sink failure(s)",
            start_time.elapsed(),
            summary
                .products_accepted
                .saturating_sub(summary.duplicates_skipped + summary.sink_failures),
            summary.products_rejected,
            summary.duplicates_skipped,
            summary.sink_failures
        );
        tracing::info!(
            "{} categories finished, {} skipped, {} listing page(s) requested, {} retried",
            summary.categories_finished,
            summary.categories_skipped,
            summary.pages_requested,
            summary.page_retries
        );

        let mut sink = Arc::try_unwrap(self.worker.sink)
            .map_err(|_| StorageError::Database("sink still in use at end of run".to_string()))?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        sink.finish_run(self.run_id, &summary)?;
        sink.close()?;

        Ok(summary)
    }

    /// Renders one listing page and hands the result to the controller
    async fn process_listing(&self, request: &PendingRequest) -> Result<ListingStep> {
        self.stats.page_requested();
        tracing::debug!("Rendering listing page {}", request.url);

        match self.renderer.render(&request.url, self.options).await {
            RenderOutcome::Success {
                html, final_url, ..
            } => self
                .controller
                .on_listing_rendered(request, &html, &final_url),
            RenderOutcome::Failure { cause } => self.controller.on_listing_failed(request, &cause),
        }
    }

    /// Moves the cursor to where `request` points
    fn track_cursor(&mut self, request: &PendingRequest) {
        let Ok((category_index, page, _)) = request.listing_route() else {
            return;
        };

        match self.cursor.as_mut() {
            Some(cursor) if cursor.category_index == category_index => {
                while cursor.page < page {
                    cursor.advance_page();
                }
            }
            Some(cursor) => cursor.move_to_category(category_index),
            None => self.cursor = Some(CrawlCursor::new(category_index)),
        }
    }

    /// Continues with the next category after a chain was dropped
    fn after_malformed(&self) -> ListingStep {
        ListingStep {
            products: Vec::new(),
            next: self
                .cursor
                .and_then(|cursor| self.controller.finish_category(cursor.category_index)),
        }
    }
}

fn log_join(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!("Product task failed: {}", e);
    }
}

/// Everything a product task needs, shared across tasks
struct ProductWorker<S> {
    extractor: Arc<Extractor>,
    renderer: Arc<dyn Renderer>,
    sink: Arc<Mutex<S>>,
    retry: RetryPolicy,
    options: RenderOptions,
    stats: RunStats,
}

impl<S> Clone for ProductWorker<S> {
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
            renderer: Arc::clone(&self.renderer),
            sink: Arc::clone(&self.sink),
            retry: self.retry,
            options: self.options,
            stats: self.stats.clone(),
        }
    }
}

impl<S> ProductWorker<S>
where
    S: ProductSink + Send + 'static,
{
    /// Renders a product page, retrying failed renders, and stores the result
    async fn run(self, mut request: PendingRequest) {
        loop {
            match self.renderer.render(&request.url, self.options).await {
                RenderOutcome::Success {
                    html,
                    final_url,
                    status_code,
                } => {
                    let page = RenderedPage {
                        html: &html,
                        final_url: &final_url,
                        status_code,
                    };
                    if let Err(e) = self.handle_product(&request, &page) {
                        tracing::error!("Dropping product request {}: {}", request.url, e);
                    }
                    return;
                }
                RenderOutcome::Failure { cause } => {
                    self.stats.render_failed();
                    tracing::error!("Render failed for product {}: {}", request.url, cause);

                    if !self.retry.should_retry(request.retry_count()) {
                        tracing::error!(
                            "Max retry attempts reached for product {}. Giving up.",
                            request.url
                        );
                        return;
                    }
                    request = request.retried();
                    tracing::warn!(
                        "Retrying product {} (attempt {})",
                        request.url,
                        request.retry_count()
                    );
                }
            }
        }
    }

    fn handle_product(
        &self,
        request: &PendingRequest,
        page: &RenderedPage<'_>,
    ) -> Result<()> {
        let (product_url, category_url) = request.product_route()?;
        let context = ProductContext {
            product_url,
            category_url,
        };

        let record = match self.extractor.extract(page, &context) {
            Ok(record) => record,
            Err(rejection) => {
                self.stats.product_rejected();
                tracing::warn!("Rejected product {}: {}", product_url, rejection);
                return Ok(());
            }
        };

        let total = self.stats.product_accepted();
        tracing::info!("Scraped products so far: {}", total);

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        match sink.upsert(&record) {
            Ok(UpsertOutcome::Inserted) => {
                tracing::debug!("Stored product {}", record.product_url);
            }
            Ok(UpsertOutcome::DuplicateSkipped) => {
                self.stats.duplicate_skipped();
                tracing::debug!("Duplicate product skipped: {}", record.product_url);
            }
            Err(e) => {
                self.stats.sink_failed();
                tracing::error!("Failed to store product {}: {}", record.product_url, e);
            }
        }

        Ok(())
    }
}
