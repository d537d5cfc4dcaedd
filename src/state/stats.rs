use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters shared by the listing chain and the product tasks of one run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    categories_finished: AtomicU64,
    categories_skipped: AtomicU64,
    pages_requested: AtomicU64,
    page_retries: AtomicU64,
    pages_exhausted: AtomicU64,
    products_dispatched: AtomicU64,
    products_accepted: AtomicU64,
    products_rejected: AtomicU64,
    duplicates_skipped: AtomicU64,
    sink_failures: AtomicU64,
    render_failures: AtomicU64,
}

/// Point-in-time copy of the run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub categories_finished: u64,
    pub categories_skipped: u64,
    pub pages_requested: u64,
    pub page_retries: u64,
    pub pages_exhausted: u64,
    pub products_dispatched: u64,
    pub products_accepted: u64,
    pub products_rejected: u64,
    pub duplicates_skipped: u64,
    pub sink_failures: u64,
    pub render_failures: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category_finished(&self) {
        self.inner.categories_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn category_skipped(&self) {
        self.inner.categories_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_requested(&self) {
        self.inner.pages_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_retried(&self) {
        self.inner.page_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_exhausted(&self) {
        self.inner.pages_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn product_dispatched(&self) {
        self.inner.products_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an accepted product and returns the running total
    pub fn product_accepted(&self) -> u64 {
        self.inner.products_accepted.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn product_rejected(&self) {
        self.inner.products_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_skipped(&self) {
        self.inner.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sink_failed(&self) {
        self.inner.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_failed(&self) {
        self.inner.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> RunSummary {
        let c = &self.inner;
        RunSummary {
            categories_finished: c.categories_finished.load(Ordering::Relaxed),
            categories_skipped: c.categories_skipped.load(Ordering::Relaxed),
            pages_requested: c.pages_requested.load(Ordering::Relaxed),
            page_retries: c.page_retries.load(Ordering::Relaxed),
            pages_exhausted: c.pages_exhausted.load(Ordering::Relaxed),
            products_dispatched: c.products_dispatched.load(Ordering::Relaxed),
            products_accepted: c.products_accepted.load(Ordering::Relaxed),
            products_rejected: c.products_rejected.load(Ordering::Relaxed),
            duplicates_skipped: c.duplicates_skipped.load(Ordering::Relaxed),
            sink_failures: c.sink_failures.load(Ordering::Relaxed),
            render_failures: c.render_failures.load(Ordering::Relaxed),
        }
    }
}
