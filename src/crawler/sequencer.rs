//! Category sequencing
//!
//! Categories are visited one at a time in configured order. The sequencer
//! answers a single question: which category comes next.

use crate::config::CategoryEntry;
use crate::state::RunStats;
use crate::url::category_slug;
use crate::ConfigError;
use url::Url;

/// One configured category listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Position in the traversal order
    pub index: usize,

    /// Page 1 URL of the category
    pub url: Url,

    /// Skip this category entirely
    pub skip: bool,
}

impl Category {
    /// Short name for log lines
    pub fn slug(&self) -> String {
        category_slug(self.url.as_str())
    }
}

/// Ordered, immutable category sequence of one run
#[derive(Debug, Clone)]
pub struct CategorySequencer {
    categories: Vec<Category>,
    stats: RunStats,
}

impl CategorySequencer {
    /// Creates a sequencer over an already-built category list
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            stats: RunStats::new(),
        }
    }

    /// Builds the sequence from configuration entries
    pub fn from_config(entries: &[CategoryEntry]) -> Result<Self, ConfigError> {
        let categories = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let url = Url::parse(&entry.url).map_err(|e| {
                    ConfigError::InvalidUrl(format!("Invalid category URL '{}': {}", entry.url, e))
                })?;
                Ok(Category {
                    index,
                    url,
                    skip: entry.skip,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self::new(categories))
    }

    /// Reports skipped categories into the given run counters
    pub fn with_stats(mut self, stats: RunStats) -> Self {
        self.stats = stats;
        self
    }

    /// Scans forward from `start_index` and returns the first category not
    /// flagged `skip`, or `None` once the sequence is exhausted
    pub fn next_eligible_category(&self, start_index: usize) -> Option<usize> {
        for category in self.categories.iter().skip(start_index) {
            if category.skip {
                tracing::info!("Skipping category: {}", category.slug());
                self.stats.category_skipped();
                continue;
            }
            return Some(category.index);
        }
        None
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
