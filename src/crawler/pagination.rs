//! Pagination controller
//!
//! Decides what happens after each listing page render. Handlers are plain
//! functions of (request, render result) returning a [`ListingStep`]; they
//! never perform I/O, so the whole listing state machine is testable without
//! a renderer.

use crate::config::CrawlerConfig;
use crate::crawler::parser::ListingParser;
use crate::crawler::request::PendingRequest;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::sequencer::{Category, CategorySequencer};
use crate::state::{RunStats, SeenProductSet};
use crate::url::{canonicalize_url, listing_page_url};
use crate::CatalogError;
use url::Url;

/// Next actions after a listing page completes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingStep {
    /// Product pages to render, at most the per-page fan-out cap
    pub products: Vec<PendingRequest>,

    /// The next listing request (retry, next page or next category);
    /// `None` ends the crawl
    pub next: Option<PendingRequest>,
}

impl ListingStep {
    fn retry(request: PendingRequest) -> Self {
        Self {
            products: Vec::new(),
            next: Some(request),
        }
    }
}

/// Drives page-by-page traversal of each category
#[derive(Debug)]
pub struct PaginationController {
    sequencer: CategorySequencer,
    parser: ListingParser,
    retry: RetryPolicy,
    seen: SeenProductSet,
    stats: RunStats,
    max_products_per_page: usize,
}

impl PaginationController {
    pub fn new(
        sequencer: CategorySequencer,
        parser: ListingParser,
        config: &CrawlerConfig,
        seen: SeenProductSet,
        stats: RunStats,
    ) -> Self {
        Self {
            sequencer: sequencer.with_stats(stats.clone()),
            parser,
            retry: RetryPolicy::new(config.max_retries),
            seen,
            stats,
            max_products_per_page: config.max_products_per_page,
        }
    }

    pub fn sequencer(&self) -> &CategorySequencer {
        &self.sequencer
    }

    /// First request of the run, or `None` if every category is skipped
    pub fn start(&self) -> Option<PendingRequest> {
        let index = self.sequencer.next_eligible_category(0)?;
        Some(self.begin_category(index))
    }

    /// Builds the render request for one page of a category
    pub fn request_page(
        &self,
        category_index: usize,
        page: u32,
        retry_count: u32,
    ) -> Result<PendingRequest, CatalogError> {
        let category = self.category(category_index, "unknown category index")?;
        Ok(Self::page_request(category, page, retry_count))
    }

    /// Handles a rendered listing page
    pub fn on_listing_rendered(
        &self,
        request: &PendingRequest,
        html: &str,
        final_url: &str,
    ) -> Result<ListingStep, CatalogError> {
        let (category_index, page, retry_count) = request.listing_route()?;
        let category = self.category(category_index, "unknown category index")?;

        tracing::info!("Parsing category {} page {}", category.slug(), page);
        let listing = self.parser.parse(html);

        if listing.product_links.is_empty() {
            if self.retry.should_retry(retry_count) {
                tracing::warn!(
                    "No products found on page {} of {}. Retrying (attempt {})...",
                    page,
                    category.slug(),
                    retry_count + 1
                );
                self.stats.page_retried();
                return Ok(ListingStep::retry(Self::page_request(
                    category,
                    page,
                    retry_count + 1,
                )));
            }

            tracing::info!(
                "No products found on page {} of {}. Moving to next category.",
                page,
                category.slug()
            );
            self.stats.page_exhausted();
            return Ok(ListingStep {
                products: Vec::new(),
                next: self.finish_category(category_index),
            });
        }

        let base = Url::parse(final_url)
            .or_else(|_| Url::parse(&request.url))
            .map_err(|e| request.malformed(&format!("unusable page URL: {}", e)))?;
        let products = self.dispatch_products(&listing.product_links, &base, category, page);

        let next = if listing.has_next {
            Some(Self::page_request(category, page + 1, 0))
        } else {
            tracing::info!(
                "Next link not found on page {} of {}. Moving to next category.",
                page,
                category.slug()
            );
            self.finish_category(category_index)
        };

        Ok(ListingStep { products, next })
    }

    /// Handles a listing render that failed or timed out
    pub fn on_listing_failed(
        &self,
        request: &PendingRequest,
        cause: &str,
    ) -> Result<ListingStep, CatalogError> {
        let (category_index, page, retry_count) = request.listing_route()?;
        let category = self.category(category_index, "unknown category index")?;

        tracing::error!(
            "Render failed for page {} of {}: {}",
            page,
            category.slug(),
            cause
        );
        self.stats.render_failed();

        if self.retry.should_retry(retry_count) {
            tracing::warn!(
                "Retrying page {} of {} after render failure (attempt {})",
                page,
                category.slug(),
                retry_count + 1
            );
            self.stats.page_retried();
            return Ok(ListingStep::retry(request.retried()));
        }

        tracing::error!(
            "Max retry attempts reached for page {} of {}. Moving to next category.",
            page,
            category.slug()
        );
        self.stats.page_exhausted();
        Ok(ListingStep {
            products: Vec::new(),
            next: self.finish_category(category_index),
        })
    }

    /// Closes a category and returns page 1 of the next eligible one
    pub fn finish_category(&self, category_index: usize) -> Option<PendingRequest> {
        if let Some(category) = self.sequencer.get(category_index) {
            tracing::info!("Finished category {}", category.slug());
        }
        self.stats.category_finished();

        match self.sequencer.next_eligible_category(category_index + 1) {
            Some(next) => Some(self.begin_category(next)),
            None => {
                tracing::info!("No more categories to crawl.");
                None
            }
        }
    }

    /// Canonicalizes, deduplicates and caps product links of one page
    ///
    /// Only dispatched URLs are marked seen; new links past the cap stay
    /// eligible should a later page list them again.
    fn dispatch_products(
        &self,
        links: &[String],
        base: &Url,
        category: &Category,
        page: u32,
    ) -> Vec<PendingRequest> {
        let mut products = Vec::new();
        let mut over_cap = 0usize;

        for link in links {
            let url = match canonicalize_url(link, base) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    tracing::debug!("Ignoring product link {}: {}", link, e);
                    continue;
                }
            };

            if products.len() >= self.max_products_per_page {
                if !self.seen.seen(&url) {
                    over_cap += 1;
                }
                continue;
            }

            if self.seen.mark_seen(&url) {
                self.stats.product_dispatched();
                products.push(PendingRequest::product(url, category.url.to_string()));
            }
        }

        tracing::debug!(
            "Dispatching {} new product URLs from page {} of {}",
            products.len(),
            page,
            category.slug()
        );
        if over_cap > 0 {
            tracing::warn!(
                "{} new product URLs on page {} of {} exceed the per-page cap of {} and were not requested",
                over_cap,
                page,
                category.slug(),
                self.max_products_per_page
            );
        }

        products
    }

    fn begin_category(&self, index: usize) -> PendingRequest {
        let category = &self.sequencer.categories()[index];
        tracing::info!("Starting category {}", category.slug());
        Self::page_request(category, 1, 0)
    }

    fn page_request(category: &Category, page: u32, retry_count: u32) -> PendingRequest {
        tracing::debug!("Requesting page {} of category {}", page, category.url);
        PendingRequest::listing(
            listing_page_url(&category.url, page),
            category.index,
            page,
            retry_count,
        )
    }

    fn category(&self, index: usize, reason: &str) -> Result<&Category, CatalogError> {
        self.sequencer
            .get(index)
            .ok_or_else(|| CatalogError::MalformedContext {
                url: format!("category #{}", index),
                reason: reason.to_string(),
            })
    }
}
