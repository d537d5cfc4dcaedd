//! Renderer client contract
//!
//! Pages on the target storefront only carry product data after their
//! scripts run, so every fetch goes through a rendering service. The crawl
//! core only depends on the [`Renderer`] trait; [`SplashRenderer`] talks to a
//! Splash-compatible HTTP endpoint.

mod splash;

pub use splash::{build_http_client, SplashRenderer};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while setting up a renderer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid render endpoint: {0}")]
    Endpoint(String),
}

/// Per-call options for a render request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Seconds the renderer lets scripts run before snapshotting
    pub wait_seconds: f64,
}

/// Result of rendering one URL
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The page rendered; `status_code` is the target page's status
    Success {
        html: String,
        final_url: String,
        status_code: u16,
    },

    /// Transport error, timeout or render service failure
    Failure { cause: String },
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A service that renders a URL into its final HTML
///
/// Implementations must enforce their own bounded wait and report a timeout
/// as `RenderOutcome::Failure`; the crawl core never cancels a call.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, options: RenderOptions) -> RenderOutcome;
}
