//! Listing page parser
//!
//! Reads one rendered category page and returns:
//! - Product links (raw hrefs, in document order)
//! - Whether a "next page" link is present

use crate::config::ExtractionConfig;
use crate::ConfigError;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// What a listing page offers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Product hrefs, deduplicated case-insensitively within the page
    pub product_links: Vec<String>,

    /// True if the page has a "next page" link
    pub has_next: bool,
}

/// Parser for category listing pages
#[derive(Debug)]
pub struct ListingParser {
    product_selector: Selector,
    anchor_selector: Selector,
    next_link_text: String,
}

impl ListingParser {
    /// Builds the selectors for the configured markup patterns
    pub fn new(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            product_selector: parse_selector(&format!(
                r#"a[href*="{}"]"#,
                config.product_path
            ))?,
            anchor_selector: parse_selector("a")?,
            next_link_text: config.next_link_text.clone(),
        })
    }

    /// Parses a rendered listing page
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_crawler::config::ExtractionConfig;
    /// use catalog_crawler::crawler::ListingParser;
    ///
    /// let parser = ListingParser::new(&ExtractionConfig::default()).unwrap();
    /// let page = parser.parse(r#"<a href="/product/a">A</a><a href="?page=2">Next</a>"#);
    /// assert_eq!(page.product_links, vec!["/product/a".to_string()]);
    /// assert!(page.has_next);
    /// ```
    pub fn parse(&self, html: &str) -> ListingPage {
        let document = Html::parse_document(html);

        let product_links = self.extract_product_links(&document);
        let has_next = self.has_next_link(&document);

        ListingPage {
            product_links,
            has_next,
        }
    }

    fn extract_product_links(&self, document: &Html) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&self.product_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() {
                continue;
            }
            if seen.insert(href.to_lowercase()) {
                links.push(href.to_string());
            }
        }

        links
    }

    fn has_next_link(&self, document: &Html) -> bool {
        document.select(&self.anchor_selector).any(|element| {
            element
                .text()
                .collect::<String>()
                .contains(&self.next_link_text)
        })
    }
}

/// Parses a CSS selector, reporting failures as configuration errors
pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidPattern(format!("{}: {:?}", selector, e)))
}
