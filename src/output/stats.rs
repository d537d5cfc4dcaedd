//! Statistics generation from the product database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::output::OutputResult;
use crate::storage::{RunRecord, SqliteSink};
use crate::url::category_slug;

/// Number of runs shown by `--stats`
pub const RECENT_RUN_LIMIT: usize = 5;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stored products
    pub total_products: u64,

    /// Stored products per category URL, largest first
    pub products_by_category: Vec<(String, u64)>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(sink: &SqliteSink) -> OutputResult<CrawlStatistics> {
    Ok(CrawlStatistics {
        total_products: sink.count_products()?,
        products_by_category: sink.count_by_category()?,
        recent_runs: sink.recent_runs(RECENT_RUN_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total products stored: {}", stats.total_products);
    println!("  Categories with products: {}", stats.products_by_category.len());
    println!();

    if !stats.products_by_category.is_empty() {
        println!("Products by Category:");
        for (category, count) in &stats.products_by_category {
            let percentage = if stats.total_products > 0 {
                (*count as f64 / stats.total_products as f64) * 100.0
            } else {
                0.0
            };
            println!(
                "  {}: {} ({:.1}%)",
                category_slug(category),
                count,
                percentage
            );
        }
        println!();
    }

    if stats.recent_runs.is_empty() {
        println!("No crawl runs recorded.");
        return;
    }

    println!("Recent Runs:");
    for run in &stats.recent_runs {
        println!(
            "  #{} [{}] started {}{}",
            run.id,
            run.status.to_db_string(),
            run.started_at,
            run.finished_at
                .as_deref()
                .map(|f| format!(", finished {}", f))
                .unwrap_or_default()
        );
        let s = &run.summary;
        println!(
            "    pages: {} requested, {} retried, {} exhausted",
            s.pages_requested, s.page_retries, s.pages_exhausted
        );
        println!(
            "    products: {} dispatched, {} accepted, {} rejected, {} duplicates",
            s.products_dispatched, s.products_accepted, s.products_rejected, s.duplicates_skipped
        );
        if s.render_failures > 0 || s.sink_failures > 0 {
            println!(
                "    failures: {} render, {} sink",
                s.render_failures, s.sink_failures
            );
        }
    }
}
