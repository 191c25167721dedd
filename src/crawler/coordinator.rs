//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the other crawler pieces
//! together:
//! - Validating the crawl request before any I/O
//! - Managing the breadth-first frontier and the visited map
//! - Running fetch, extraction and link resolution on a bounded worker pool
//! - Enforcing the page budget and the depth limit
//! - Handling cancellation and the optional crawl deadline
//!
//! All crawl state is owned by the dispatcher loop of a single invocation.
//! Workers never touch it; they hand their results back through a `JoinSet`
//! and the dispatcher applies them one at a time, so claiming a URL
//! (visited test-and-insert plus budget increment) is never contended.

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::extractor::{extract, PageSummary};
use crate::crawler::fetcher::{build_http_client, FetchOutcome, Fetcher, DEFAULT_STATIC_TIMEOUT};
use crate::crawler::links::LinkResolver;
use crate::crawler::render::WebDriverRenderer;
use crate::state::PageState;
use crate::url::{parse_http_url, ScopeMode, SiteScope};
use crate::GleanError;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Error recorded for a page whose worker never reported back
const ABORTED: &str = "page processing aborted";

/// Validated input for one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    seed: Url,
    max_depth: u32,
    max_pages: usize,
}

impl CrawlRequest {
    /// Validates a crawl request
    ///
    /// # Arguments
    ///
    /// * `seed` - Absolute HTTP(S) URL to start from
    /// * `max_depth` - Maximum link depth, inclusive (0 fetches only the seed)
    /// * `max_pages` - Total page budget across all depths; must be positive
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlRequest)` - The request is valid
    /// * `Err(GleanError::InvalidSeed)` - The seed is not an absolute HTTP(S) URL
    /// * `Err(GleanError::InvalidBudget)` - `max_pages` is zero
    pub fn new(seed: &str, max_depth: u32, max_pages: usize) -> Result<Self, GleanError> {
        let mut seed = parse_http_url(seed)?;
        seed.set_fragment(None);

        if max_pages == 0 {
            return Err(GleanError::InvalidBudget(
                "max pages must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            seed,
            max_depth,
            max_pages,
        })
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub url: String,
    pub error: String,
}

/// Outcome for one crawled page
///
/// Serialized untagged: a failure is recognized by its `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageResult {
    Success(PageSummary),
    Failure(PageFailure),
}

impl PageResult {
    pub fn url(&self) -> &str {
        match self {
            Self::Success(summary) => &summary.url,
            Self::Failure(failure) => &failure.url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn as_success(&self) -> Option<&PageSummary> {
        match self {
            Self::Success(summary) => Some(summary),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&PageFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// Knobs that shape a crawl without changing its request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of pages processed concurrently
    pub workers: usize,
    pub scope: ScopeMode,
    /// Stop claiming new pages once this much time has passed
    pub deadline: Option<Duration>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            scope: ScopeMode::ExactHost,
            deadline: None,
        }
    }
}

impl From<&CrawlerConfig> for CrawlOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            scope: config.scope,
            deadline: config.crawl_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Drives bounded, same-site crawls
pub struct Crawler {
    fetcher: Arc<Fetcher>,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(fetcher: Fetcher, options: CrawlOptions) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            options,
        }
    }

    /// Static-only crawler with default timeouts and user agent
    pub fn with_defaults() -> Result<Self, GleanError> {
        let client = build_http_client(&UserAgentConfig::default(), DEFAULT_STATIC_TIMEOUT)?;
        Ok(Self::new(Fetcher::new(client), CrawlOptions::default()))
    }

    /// Builds a crawler from configuration
    ///
    /// A `[renderer]` section enables the rendered fallback.
    pub fn from_config(config: &Config) -> Result<Self, GleanError> {
        let static_timeout = Duration::from_millis(config.crawler.static_timeout_ms);
        let client = build_http_client(&config.user_agent, static_timeout)?;
        let mut fetcher = Fetcher::new(client);

        if let Some(renderer) = &config.renderer {
            fetcher = fetcher.with_renderer(
                Arc::new(WebDriverRenderer::from_config(renderer)),
                Duration::from_millis(config.crawler.render_timeout_ms),
            );
        }

        Ok(Self::new(fetcher, CrawlOptions::from(&config.crawler)))
    }

    /// Runs a crawl to completion
    pub async fn crawl(&self, request: &CrawlRequest) -> Vec<PageResult> {
        self.crawl_until(request, CancellationToken::new()).await
    }

    /// Runs a crawl until it completes or `cancel` fires
    ///
    /// # Traversal
    ///
    /// 1. Seed the frontier with `(seed, 0)`
    /// 2. Claim frontier entries in FIFO (breadth-first) order, skipping
    ///    entries deeper than `max_depth` or already visited, until the page
    ///    budget is spent or `workers` pages are in flight
    /// 3. Each claimed page is fetched, extracted and link-resolved off the
    ///    dispatcher
    /// 4. Same-site children of a successful page are enqueued at depth + 1;
    ///    a failed page contributes no children
    /// 5. Return once the frontier is empty and nothing is in flight
    ///
    /// Cancellation (or the configured deadline) stops claiming new pages and
    /// waits for in-flight pages, which are bounded by the fetcher timeouts.
    /// The partial results gathered so far are returned, never an error.
    ///
    /// Results are ordered by claim order. With a single worker this is strict
    /// breadth-first order.
    pub async fn crawl_until(
        &self,
        request: &CrawlRequest,
        cancel: CancellationToken,
    ) -> Vec<PageResult> {
        let Some(scope) = SiteScope::new(&request.seed, self.options.scope) else {
            return Vec::new();
        };
        let resolver = LinkResolver::new(scope);
        let workers = self.options.workers.max(1);

        tracing::info!(
            "Starting crawl of {} (max depth {}, max pages {})",
            request.seed,
            request.max_depth,
            request.max_pages
        );
        let start_time = Instant::now();

        let deadline = self.options.deadline;
        let deadline_expired = async move {
            match deadline {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_expired);

        let mut state = CrawlState::new(&request.seed);
        let mut tasks = JoinSet::new();
        let mut stopped = false;

        loop {
            if !stopped && cancel.is_cancelled() {
                stopped = true;
            }

            if !stopped {
                while tasks.len() < workers {
                    let Some((slot, url, depth)) = state.claim_next(request) else {
                        break;
                    };
                    tracing::debug!("Claimed {} at depth {}", url, depth);

                    let fetcher = Arc::clone(&self.fetcher);
                    let resolver = resolver.clone();
                    tasks.spawn(async move {
                        let work = process_page(&fetcher, &resolver, &url).await;
                        (slot, depth, work)
                    });
                }
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled(), if !stopped => {
                    tracing::info!(
                        "Crawl of {} cancelled, waiting for {} in-flight pages",
                        request.seed,
                        tasks.len()
                    );
                    stopped = true;
                }
                _ = &mut deadline_expired, if !stopped => {
                    tracing::warn!(
                        "Crawl of {} hit its deadline, waiting for {} in-flight pages",
                        request.seed,
                        tasks.len()
                    );
                    stopped = true;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((slot, depth, work))) => {
                        state.complete(slot, depth, work, request.max_depth);
                    }
                    Some(Err(e)) => {
                        tracing::error!("Page task for {} failed: {}", request.seed, e);
                    }
                    None => break,
                },
            }
        }

        let results = state.finish();
        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::info!(
            "Crawl of {} completed: {} pages ({} failed) in {:?}",
            request.seed,
            results.len(),
            failed,
            start_time.elapsed()
        );

        results
    }

    /// Crawls several seeds independently and concatenates their results
    ///
    /// Every seed is validated before any crawl starts, so one bad seed
    /// rejects the whole batch without I/O. Each seed gets its own budget.
    pub async fn crawl_many(
        &self,
        seeds: &[String],
        max_depth: u32,
        max_pages: usize,
        cancel: CancellationToken,
    ) -> Result<Vec<PageResult>, GleanError> {
        let requests = seeds
            .iter()
            .map(|seed| CrawlRequest::new(seed, max_depth, max_pages))
            .collect::<Result<Vec<_>, _>>()?;

        let crawls = requests
            .iter()
            .map(|request| self.crawl_until(request, cancel.clone()));

        Ok(futures::future::join_all(crawls)
            .await
            .into_iter()
            .flatten()
            .collect())
    }
}

/// What a worker hands back for one page
#[derive(Debug)]
struct PageWork {
    result: PageResult,
    /// In-scope links found on the page; empty for failures
    children: Vec<Url>,
}

/// Fetch, extract and resolve links for one page
async fn process_page(fetcher: &Fetcher, resolver: &LinkResolver, url: &Url) -> PageWork {
    match fetcher.fetch(url.as_str()).await {
        FetchOutcome::Html {
            raw,
            final_url,
            via_rendered_fallback,
        } => {
            if via_rendered_fallback {
                tracing::debug!("{} was rendered by the fallback fetcher", url);
            }
            if final_url != *url {
                tracing::debug!("{} was served from {}", url, final_url);
            }
            // Relative links are relative to where the document ended up
            PageWork {
                result: PageResult::Success(extract(url.as_str(), &raw)),
                children: resolver.resolve(&raw, &final_url),
            }
        }
        FetchOutcome::Failed { reason } => {
            tracing::warn!("Failed to fetch {}: {}", url, reason);
            PageWork {
                result: PageResult::Failure(PageFailure {
                    url: url.to_string(),
                    error: reason.to_string(),
                }),
                children: Vec::new(),
            }
        }
    }
}

/// Result slot reserved when a page is claimed
#[derive(Debug)]
struct Slot {
    url: String,
    result: Option<PageResult>,
}

/// Mutable state of one crawl invocation
#[derive(Debug)]
struct CrawlState {
    frontier: VecDeque<(Url, u32)>,
    /// Every URL ever enqueued, keyed by its serialized form
    pages: HashMap<String, PageState>,
    pages_crawled: usize,
    slots: Vec<Slot>,
}

impl CrawlState {
    fn new(seed: &Url) -> Self {
        let mut pages = HashMap::new();
        pages.insert(seed.as_str().to_string(), PageState::Pending);

        let mut frontier = VecDeque::new();
        frontier.push_back((seed.clone(), 0));

        Self {
            frontier,
            pages,
            pages_crawled: 0,
            slots: Vec::new(),
        }
    }

    /// Claims the next fetchable frontier entry
    ///
    /// Skipped entries are not counted against the budget. Returns None once
    /// the budget is spent or the frontier holds nothing fetchable.
    fn claim_next(&mut self, request: &CrawlRequest) -> Option<(usize, Url, u32)> {
        while self.pages_crawled < request.max_pages {
            let (url, depth) = self.frontier.pop_front()?;

            if depth > request.max_depth {
                tracing::trace!("Skipping {}: depth {} beyond limit", url, depth);
                continue;
            }

            let state = self
                .pages
                .entry(url.as_str().to_string())
                .or_insert(PageState::Pending);
            if state.is_visited() {
                tracing::trace!("Skipping {}: already {}", url, state);
                continue;
            }
            *state = PageState::Fetching;

            self.pages_crawled += 1;
            self.slots.push(Slot {
                url: url.to_string(),
                result: None,
            });
            return Some((self.slots.len() - 1, url, depth));
        }
        None
    }

    /// Records a finished page and enqueues its unseen children
    fn complete(&mut self, slot: usize, depth: u32, work: PageWork, max_depth: u32) {
        let next = if work.result.is_success() {
            PageState::Succeeded
        } else {
            PageState::Failed
        };

        if let Some(entry) = self.slots.get_mut(slot) {
            if let Some(state) = self.pages.get_mut(&entry.url) {
                if state.can_transition_to(next) {
                    *state = next;
                }
            }
            entry.result = Some(work.result);
        }

        if depth >= max_depth {
            return;
        }

        for child in work.children {
            let key = child.as_str().to_string();
            if self.pages.contains_key(&key) {
                continue;
            }
            self.pages.insert(key, PageState::Pending);
            self.frontier.push_back((child, depth + 1));
        }
    }

    fn finish(self) -> Vec<PageResult> {
        self.slots
            .into_iter()
            .map(|slot| {
                slot.result.unwrap_or_else(|| {
                    PageResult::Failure(PageFailure {
                        url: slot.url,
                        error: ABORTED.to_string(),
                    })
                })
            })
            .collect()
    }
}
