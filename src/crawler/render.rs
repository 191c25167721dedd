//! Rendered fetch through an external headless browser
//!
//! Pages that only assemble their content client-side come back nearly empty
//! from a plain HTTP GET. The fetcher falls back to a [`Renderer`] for those:
//! it navigates a real browser to the page, waits for the DOM to settle, and
//! hands back the rendered HTML.
//!
//! The bundled [`WebDriverRenderer`] talks to any WebDriver endpoint
//! (chromedriver, geckodriver, a Selenium grid) through `fantoccini`. Each call
//! opens its own browser session and always closes it before returning. The
//! render timeout covers opening the session and capturing the page; closing
//! gets a short allowance of its own.

use crate::config::RendererConfig;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Interval between `document.readyState` polls while the DOM settles
const DOM_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on how long opening a browser session may take
const SESSION_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound on closing a browser session
pub(crate) const CLOSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors produced by a rendering attempt
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start rendering session: {0}")]
    Session(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("failed to read rendered DOM: {0}")]
    Extraction(String),

    #[error("rendering timed out after {0:?}")]
    Timeout(Duration),
}

/// A page as the browser ended up showing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Document URL after any redirects
    pub url: Url,
    pub html: String,
}

/// A capability that returns the fully rendered HTML of a page
///
/// Implementations must release whatever session they open before returning,
/// whether rendering succeeded or not, and must give up after `timeout`.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<RenderedPage, RenderError>;
}

/// Renderer backed by a WebDriver session
#[derive(Debug, Clone)]
pub struct WebDriverRenderer {
    webdriver_url: String,
    headless: bool,
}

impl WebDriverRenderer {
    pub fn new(webdriver_url: impl Into<String>, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.webdriver_url.clone(), config.headless)
    }

    /// Session capabilities
    ///
    /// `pageLoadStrategy = eager` makes navigation return at DOMContentLoaded
    /// instead of waiting for every image and stylesheet.
    fn capabilities(&self) -> Map<String, Value> {
        let mut args = vec!["--disable-dev-shm-usage", "--no-sandbox"];
        if self.headless {
            args.push("--headless=new");
            args.push("--disable-gpu");
        }

        let mut caps = Map::new();
        caps.insert("pageLoadStrategy".to_string(), json!("eager"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        if self.headless {
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        caps
    }

    async fn open_session(&self, limit: Duration) -> Result<Client, RenderError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());

        match tokio::time::timeout(limit, builder.connect(&self.webdriver_url)).await {
            Ok(Ok(client)) => Ok(client),
            Ok(Err(e)) => Err(RenderError::Session(e.to_string())),
            Err(_) => Err(RenderError::Timeout(limit)),
        }
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let started = Instant::now();
        let client = self.open_session(timeout.min(SESSION_TIMEOUT)).await?;
        tracing::debug!("Rendering {} via {}", url, self.webdriver_url);

        let remaining = timeout.saturating_sub(started.elapsed());
        let outcome = tokio::time::timeout(remaining, capture(&client, url)).await;

        // Always tear the session down, even when capture failed or timed out
        match tokio::time::timeout(CLOSE_TIMEOUT, client.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Failed to close rendering session for {}: {}", url, e),
            Err(_) => tracing::warn!("Closing rendering session for {} timed out", url),
        }

        match outcome {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(timeout)),
        }
    }
}

/// Navigates to `url`, waits for the DOM to settle, and reads the page source
async fn capture(client: &Client, url: &Url) -> Result<RenderedPage, RenderError> {
    client
        .goto(url.as_str())
        .await
        .map_err(|e| RenderError::Navigation(e.to_string()))?;

    wait_for_dom(client).await?;

    let html = client
        .source()
        .await
        .map_err(|e| RenderError::Extraction(e.to_string()))?;

    let final_url = match client.current_url().await {
        Ok(current) => Url::parse(current.as_str()).unwrap_or_else(|_| url.clone()),
        Err(e) => {
            tracing::debug!("Could not read final URL of {}: {}", url, e);
            url.clone()
        }
    };

    Ok(RenderedPage {
        url: final_url,
        html,
    })
}

/// Polls `document.readyState` until the DOM has been parsed
async fn wait_for_dom(client: &Client) -> Result<(), RenderError> {
    loop {
        let state = client
            .execute("return document.readyState;", vec![])
            .await
            .map_err(|e| RenderError::Extraction(e.to_string()))?;

        if dom_settled(&state) {
            return Ok(());
        }

        tokio::time::sleep(DOM_POLL_INTERVAL).await;
    }
}

fn dom_settled(ready_state: &Value) -> bool {
    matches!(ready_state.as_str(), Some("interactive") | Some("complete"))
}
