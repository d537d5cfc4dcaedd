//! Catalog Crawler: a sequential category crawler for rendered storefronts
//!
//! This crate walks a fixed list of category listing pages, follows their
//! pagination, renders each discovered product page through an external
//! rendering service and stores validated product records keyed by URL.

pub mod config;
pub mod crawler;
pub mod output;
pub mod render;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog Crawler operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Malformed request context for {url}: {reason}")]
    MalformedContext { url: String, reason: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid extraction pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Catalog Crawler operations
pub type Result<T> = std::result::Result<T, CatalogError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ProductRecord, Rejection};
pub use state::{CrawlCursor, SeenProductSet};
pub use url::canonicalize_url;
