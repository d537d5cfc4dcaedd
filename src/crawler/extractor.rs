//! Product page extraction
//!
//! Turns one rendered product page into a validated [`ProductRecord`] or a
//! [`Rejection`]. Extraction runs in a fixed order:
//!
//! 1. Title from `<title>`, cut at the first `" | "`
//! 2. Price, trying each strategy in [`PRICE_STRATEGIES`] until one matches
//! 3. Reject if title or price is missing
//! 4. Product images, deduplicated in document order and capped
//!
//! Given the same page and context, `extract` always returns the same result.

use crate::config::ExtractionConfig;
use crate::crawler::parser::parse_selector;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// A validated product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub price: String,
    /// Canonical product URL, the store key
    pub product_url: String,
    pub images: Vec<String>,
    /// URL of the category the product was discovered in
    pub category: String,
}

/// Why a product page produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no title")]
    MissingTitle,

    #[error("no price")]
    MissingPrice,

    #[error("bad response status {0}")]
    BadStatus(u16),
}

/// A rendered product page
#[derive(Debug, Clone, Copy)]
pub struct RenderedPage<'a> {
    pub html: &'a str,
    pub final_url: &'a str,
    pub status_code: u16,
}

/// Where a product page came from
#[derive(Debug, Clone, Copy)]
pub struct ProductContext<'a> {
    pub product_url: &'a str,
    pub category_url: &'a str,
}

/// One way of finding a price on a parsed page
pub type PriceStrategy = fn(&Extractor, &Html) -> Option<String>;

/// Price strategies, most specific first
pub const PRICE_STRATEGIES: &[PriceStrategy] = &[structured_price, scanned_price];

/// Product page extractor
#[derive(Debug)]
pub struct Extractor {
    title_selector: Selector,
    currency_selector: Selector,
    price_text_selector: Selector,
    image_selector: Selector,
    price_pattern: Regex,
    leading_price_pattern: Regex,
    max_images: usize,
}

impl Extractor {
    /// Compiles selectors and the currency pattern
    pub fn new(config: &ExtractionConfig, max_images: usize) -> Result<Self, ConfigError> {
        let amount = format!(
            r"{}\s?(?:\d{{1,3}}(?:,\d{{3}})+|\d+)",
            regex::escape(&config.currency_symbol)
        );
        let price_pattern = Regex::new(&amount)
            .map_err(|e| ConfigError::InvalidPattern(format!("price pattern: {}", e)))?;
        let leading_price_pattern = Regex::new(&format!("^{}", amount))
            .map_err(|e| ConfigError::InvalidPattern(format!("price pattern: {}", e)))?;

        Ok(Self {
            title_selector: parse_selector("title")?,
            currency_selector: parse_selector(&format!(
                r#"div > span[style*="{}"]"#,
                config.price_style_marker
            ))?,
            price_text_selector: parse_selector(&format!(
                r#"span[style*="{}"]"#,
                config.price_style_marker
            ))?,
            image_selector: parse_selector(&format!(r#"img[src*="{}"]"#, config.image_path))?,
            price_pattern,
            leading_price_pattern,
            max_images,
        })
    }

    /// Extracts a product record from a rendered page
    pub fn extract(
        &self,
        page: &RenderedPage<'_>,
        context: &ProductContext<'_>,
    ) -> Result<ProductRecord, Rejection> {
        if page.status_code != 200 {
            return Err(Rejection::BadStatus(page.status_code));
        }

        let document = Html::parse_document(page.html);

        let title = self.extract_title(&document);
        let price = self.extract_price(&document);

        let title = title.ok_or(Rejection::MissingTitle)?;
        let price = price.ok_or(Rejection::MissingPrice)?;

        let images = self.extract_images(&document, page.final_url);
        if images.is_empty() {
            tracing::warn!("No images found on product page: {}", context.product_url);
        } else {
            tracing::debug!(
                "Extracted {} unique image(s) for product: {}",
                images.len(),
                context.product_url
            );
        }

        Ok(ProductRecord {
            title,
            price,
            product_url: context.product_url.to_string(),
            images,
            category: context.category_url.to_string(),
        })
    }

    /// Page title up to the first `" | "`, trimmed
    fn extract_title(&self, document: &Html) -> Option<String> {
        document
            .select(&self.title_selector)
            .next()
            .map(|element| element.text().collect::<String>())
            .and_then(|text| text.split(" | ").next().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
    }

    fn extract_price(&self, document: &Html) -> Option<String> {
        PRICE_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(self, document))
    }

    /// Product image sources, absolute, deduplicated in order and capped
    fn extract_images(&self, document: &Html, page_url: &str) -> Vec<String> {
        let base = Url::parse(page_url).ok();
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for element in document.select(&self.image_selector) {
            if images.len() >= self.max_images {
                break;
            }
            let Some(src) = element.value().attr("src").map(str::trim) else {
                continue;
            };
            if src.is_empty() {
                continue;
            }
            let absolute = base
                .as_ref()
                .and_then(|b| b.join(src).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| src.to_string());
            if seen.insert(absolute.clone()) {
                images.push(absolute);
            }
        }

        images
    }
}

/// Currency symbol node plus the amount text of its enclosing element
///
/// Matches markup like `<div><span style="font-family: ...">₦</span>12,500</div>`.
/// Only the leading currency amount is kept, so `₦1,500.50` yields `₦1,500`.
pub fn structured_price(extractor: &Extractor, document: &Html) -> Option<String> {
    let symbol_node = document.select(&extractor.currency_selector).next()?;
    let currency = direct_text(&symbol_node)?;

    let container = symbol_node.parent().and_then(ElementRef::wrap)?;
    let amount = direct_text(&container)?;

    let joined = format!("{}{}", currency, amount);
    extractor
        .leading_price_pattern
        .find(&joined)
        .map(|m| m.as_str().to_string())
}

/// First currency-prefixed amount inside any price-styled node
pub fn scanned_price(extractor: &Extractor, document: &Html) -> Option<String> {
    document
        .select(&extractor.price_text_selector)
        .find_map(|element| {
            let text = element.text().collect::<String>();
            extractor
                .price_pattern
                .find(&text)
                .map(|m| m.as_str().to_string())
        })
}

/// First non-blank text node directly under an element, trimmed
fn direct_text(element: &ElementRef<'_>) -> Option<String> {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
