//! HTTP fetcher implementation
//!
//! This module retrieves raw HTML for one URL using a two-tier strategy:
//! - A cheap static GET with a short timeout
//! - A rendered fetch through a headless browser when the static path fails
//!
//! Fetch failures are ordinary values ([`FetchOutcome::Failed`]), never panics
//! or errors that abort a crawl.

use crate::config::UserAgentConfig;
use crate::crawler::render::{Renderer, CLOSE_TIMEOUT};
use crate::url::parse_http_url;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default timeout for the static GET
pub const DEFAULT_STATIC_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for one rendered fetch
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack on top of the renderer's own close allowance
const RENDER_TEARDOWN_GRACE: Duration = Duration::from_secs(2);

/// Result of fetching one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Raw HTML for the page
    Html {
        raw: String,
        /// URL the document was served from, after redirects
        final_url: Url,
        /// True if the static fetch failed and the page was rendered instead
        via_rendered_fallback: bool,
    },

    /// The page could not be retrieved
    Failed { reason: FetchFailure },
}

/// Why a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("invalid url")]
    InvalidUrl,

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("expected HTML, got {0}")]
    NotHtml(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("static fetch failed ({primary}); rendered fetch failed ({rendered})")]
    Exhausted {
        primary: Box<FetchFailure>,
        rendered: String,
    },
}

impl FetchFailure {
    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Builds the HTTP client used for static fetches
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout for the static path
///
/// # Example
///
/// ```no_run
/// use sitegleaner::config::UserAgentConfig;
/// use sitegleaner::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "SiteGleaner".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(5)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages, static first, rendered second
pub struct Fetcher {
    client: Client,
    renderer: Option<Arc<dyn Renderer>>,
    render_timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher with no rendered fallback
    pub fn new(client: Client) -> Self {
        Self {
            client,
            renderer: None,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Enables the rendered fallback
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>, timeout: Duration) -> Self {
        self.renderer = Some(renderer);
        self.render_timeout = timeout;
        self
    }

    /// Fetches a URL
    ///
    /// # Request Flow
    ///
    /// 1. Validate the URL; reject anything that is not absolute HTTP(S)
    ///    without touching the network
    /// 2. Static GET (short timeout); accept a 2xx HTML response
    /// 3. On any static failure, render the page through the configured
    ///    [`Renderer`] (bounded by the render timeout)
    /// 4. If both fail, or no renderer is configured, report the terminal cause
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | Malformed / non-HTTP URL | `InvalidUrl`, no I/O |
    /// | Timeout | `Timeout` → fallback |
    /// | Non-2xx status | `Status` → fallback |
    /// | Non-HTML Content-Type | `NotHtml` → fallback |
    /// | Connection / TLS failure | `Connect` / `Network` → fallback |
    /// | Fallback also fails | `Exhausted` |
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let parsed = match parse_http_url(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Rejecting {}: {}", url, e);
                return FetchOutcome::Failed {
                    reason: FetchFailure::InvalidUrl,
                };
            }
        };

        let primary = match self.fetch_static(&parsed).await {
            Ok((final_url, raw)) => {
                return FetchOutcome::Html {
                    raw,
                    final_url,
                    via_rendered_fallback: false,
                }
            }
            Err(failure) => failure,
        };

        let Some(renderer) = &self.renderer else {
            return FetchOutcome::Failed { reason: primary };
        };

        tracing::warn!(
            "Static fetch of {} failed ({}), falling back to rendered fetch",
            parsed,
            primary
        );

        let budget = self.render_timeout + CLOSE_TIMEOUT + RENDER_TEARDOWN_GRACE;
        let rendered = tokio::time::timeout(budget, renderer.render(&parsed, self.render_timeout))
            .await
            .map_err(|_| format!("rendering timed out after {:?}", budget))
            .and_then(|result| result.map_err(|e| e.to_string()));

        match rendered {
            Ok(page) => FetchOutcome::Html {
                raw: page.html,
                final_url: page.url,
                via_rendered_fallback: true,
            },
            Err(rendered) => FetchOutcome::Failed {
                reason: FetchFailure::Exhausted {
                    primary: Box::new(primary),
                    rendered,
                },
            },
        }
    }

    /// Plain GET; succeeds only on a 2xx response carrying HTML
    async fn fetch_static(&self, url: &Url) -> Result<(Url, String), FetchFailure> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchFailure::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return Err(FetchFailure::NotHtml(content_type));
        }

        let final_url = response.url().clone();
        let raw = response
            .text()
            .await
            .map_err(|e| FetchFailure::from_reqwest(&e))?;
        Ok((final_url, raw))
    }
}

/// Servers that omit Content-Type are given the benefit of the doubt
fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.trim().is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}
