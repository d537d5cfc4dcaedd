//! Splash-compatible render client
//!
//! Sends each URL to the service's `render.html` endpoint as a JSON POST and
//! classifies the reply:
//!
//! | Reply | Outcome |
//! |-------|---------|
//! | HTTP 500, 502, 503, 504, 408 | `Failure` (retryable) |
//! | Client timeout / connection error | `Failure` |
//! | Any other status | `Success` carrying that status |

use crate::config::{RendererConfig, UserAgentConfig};
use crate::render::{RenderError, RenderOptions, RenderOutcome, Renderer};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Reply statuses that mean the render itself failed
const FAILURE_STATUS_CODES: &[u16] = &[500, 502, 503, 504, 408];

/// Extra client-side slack on top of the service timeout so the service
/// gets to report its own timeout first
const CLIENT_TIMEOUT_SLACK_SECS: u64 = 10;

/// JSON body accepted by `render.html`
#[derive(Debug, Serialize)]
struct RenderArgs<'a> {
    url: &'a str,
    wait: f64,
    timeout: u64,
    http_status_from_error_code: bool,
    headers: RenderHeaders<'a>,
}

#[derive(Debug, Serialize)]
struct RenderHeaders<'a> {
    #[serde(rename = "User-Agent")]
    user_agent: &'a str,
}

/// Builds the HTTP client used to reach the render service
pub fn build_http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs + CLIENT_TIMEOUT_SLACK_SECS))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Render client for a Splash-compatible service
pub struct SplashRenderer {
    client: Client,
    render_url: Url,
    timeout_secs: u64,
    agents: Vec<String>,
}

impl SplashRenderer {
    /// Creates a renderer from configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use catalog_crawler::config::{RendererConfig, UserAgentConfig};
    /// use catalog_crawler::render::SplashRenderer;
    ///
    /// let renderer = SplashRenderer::new(
    ///     &RendererConfig { endpoint: "http://localhost:8050".to_string(), timeout_secs: 60 },
    ///     &UserAgentConfig { agents: vec!["Mozilla/5.0".to_string()] },
    /// ).unwrap();
    /// ```
    pub fn new(
        renderer: &RendererConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, RenderError> {
        let mut endpoint = Url::parse(&renderer.endpoint)
            .map_err(|e| RenderError::Endpoint(format!("{}: {}", renderer.endpoint, e)))?;
        // Keep any path prefix, e.g. a gateway mount point
        if !endpoint.path().ends_with('/') {
            let prefix = format!("{}/", endpoint.path());
            endpoint.set_path(&prefix);
        }
        let render_url = endpoint
            .join("render.html")
            .map_err(|e| RenderError::Endpoint(e.to_string()))?;

        Ok(Self {
            client: build_http_client(renderer.timeout_secs)?,
            render_url,
            timeout_secs: renderer.timeout_secs,
            agents: user_agent.agents.clone(),
        })
    }

    /// Picks a user agent at random for one request
    fn pick_user_agent(&self) -> &str {
        self.agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or("Mozilla/5.0")
    }
}

#[async_trait]
impl Renderer for SplashRenderer {
    async fn render(&self, url: &str, options: RenderOptions) -> RenderOutcome {
        let user_agent = self.pick_user_agent();
        let args = RenderArgs {
            url,
            wait: options.wait_seconds,
            timeout: self.timeout_secs,
            http_status_from_error_code: true,
            headers: RenderHeaders { user_agent },
        };

        tracing::trace!("Rendering {} (wait {}s)", url, options.wait_seconds);

        let response = match self
            .client
            .post(self.render_url.clone())
            .header(USER_AGENT, user_agent)
            .json(&args)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let cause = if e.is_timeout() {
                    format!("render timed out after {}s", self.timeout_secs)
                } else if e.is_connect() {
                    format!("render service unreachable: {}", e)
                } else {
                    e.to_string()
                };
                return RenderOutcome::Failure { cause };
            }
        };

        let status_code = response.status().as_u16();
        if FAILURE_STATUS_CODES.contains(&status_code) {
            return RenderOutcome::Failure {
                cause: format!("render service returned HTTP {}", status_code),
            };
        }

        match response.text().await {
            Ok(html) => RenderOutcome::Success {
                html,
                final_url: url.to_string(),
                status_code,
            },
            Err(e) => RenderOutcome::Failure {
                cause: format!("failed to read rendered body: {}", e),
            },
        }
    }
}
