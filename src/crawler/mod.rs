//! Crawler module for bounded same-site crawls
//!
//! This module contains the core crawling logic, including:
//! - Two-tier page fetching (static GET, then a rendered fallback)
//! - Content extraction into page summaries
//! - Same-site link resolution
//! - Overall crawl coordination on a bounded worker pool

mod coordinator;
mod extractor;
mod fetcher;
mod links;
mod render;

pub use coordinator::{CrawlOptions, CrawlRequest, Crawler, PageFailure, PageResult};
pub use extractor::{extract, PageSummary, CONTENT_SUMMARY_CHARS, NO_H1, NO_H2, NO_TITLE};
pub use fetcher::{
    build_http_client, FetchFailure, FetchOutcome, Fetcher, DEFAULT_RENDER_TIMEOUT,
    DEFAULT_STATIC_TIMEOUT,
};
pub use links::LinkResolver;
pub use render::{RenderError, RenderedPage, Renderer, WebDriverRenderer};

use crate::GleanError;

/// Crawls one site with default settings
///
/// This is the embedding entry point: it validates the input, crawls
/// breadth-first from `seed`, and returns one [`PageResult`] per fetched page.
/// Page failures are entries in the returned list; only invalid input is an
/// error.
///
/// # Arguments
///
/// * `seed` - Absolute HTTP(S) URL to start from
/// * `max_depth` - Maximum link depth (0 fetches only the seed)
/// * `max_pages` - Total page budget, at least 1
///
/// # Example
///
/// ```no_run
/// # async fn example() -> sitegleaner::Result<()> {
/// let results = sitegleaner::crawl("https://example.com/", 1, 5).await?;
/// for result in &results {
///     println!("{} ok={}", result.url(), result.is_success());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    seed: &str,
    max_depth: u32,
    max_pages: usize,
) -> Result<Vec<PageResult>, GleanError> {
    let request = CrawlRequest::new(seed, max_depth, max_pages)?;
    let crawler = Crawler::with_defaults()?;
    Ok(crawler.crawl(&request).await)
}
