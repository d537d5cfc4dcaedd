use serde::Deserialize;

/// Main configuration structure for Catalog Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub renderer: RendererConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
    /// Category listing pages in traversal order
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seconds the renderer waits for scripts before snapshotting the page
    #[serde(rename = "wait-seconds", default = "default_wait_seconds")]
    pub wait_seconds: f64,

    /// Upper bound on the retry count of a single request chain
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum product requests dispatched from one listing page
    #[serde(
        rename = "max-products-per-page",
        default = "default_max_products_per_page"
    )]
    pub max_products_per_page: usize,

    /// Maximum images kept on a product record
    #[serde(
        rename = "max-images-per-product",
        default = "default_max_images_per_product"
    )]
    pub max_images_per_product: usize,

    /// Pause before each listing request (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            wait_seconds: default_wait_seconds(),
            max_retries: default_max_retries(),
            max_products_per_page: default_max_products_per_page(),
            max_images_per_product: default_max_images_per_product(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

/// Rendering service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    /// Base URL of the render service (e.g. "http://localhost:8050")
    pub endpoint: String,

    /// Hard limit on a single render call, in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// User agent identities used for render requests
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Candidate user agent strings; one is picked per request
    pub agents: Vec<String>,
}

/// Markup patterns the listing parser and product extractor look for
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Substring identifying product detail links
    #[serde(rename = "product-path", default = "default_product_path")]
    pub product_path: String,

    /// Substring identifying product image sources
    #[serde(rename = "image-path", default = "default_product_path")]
    pub image_path: String,

    /// Anchor text marking the pagination "next" affordance
    #[serde(rename = "next-link-text", default = "default_next_link_text")]
    pub next_link_text: String,

    /// Currency symbol prefixing prices
    #[serde(rename = "currency-symbol", default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Inline style fragment carried by the price nodes
    #[serde(rename = "price-style-marker", default = "default_price_style_marker")]
    pub price_style_marker: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            product_path: default_product_path(),
            image_path: default_product_path(),
            next_link_text: default_next_link_text(),
            currency_symbol: default_currency_symbol(),
            price_style_marker: default_price_style_marker(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// One category listing page
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Page 1 URL of the category
    pub url: String,

    /// Skip this category entirely
    #[serde(default)]
    pub skip: bool,
}

fn default_wait_seconds() -> f64 {
    5.0
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_products_per_page() -> usize {
    5
}

fn default_max_images_per_product() -> usize {
    3
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_product_path() -> String {
    "/product/".to_string()
}

fn default_next_link_text() -> String {
    "Next".to_string()
}

fn default_currency_symbol() -> String {
    "₦".to_string()
}

fn default_price_style_marker() -> String {
    "font-family".to_string()
}
