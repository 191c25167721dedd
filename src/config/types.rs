use crate::url::ScopeMode;
use serde::{Deserialize, Serialize};

/// Main configuration structure for SiteGleaner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Seed URLs crawled by the CLI when no `--seed` is given
    #[serde(default)]
    pub seeds: Vec<String>,

    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    /// Headless rendering fallback; absent means static fetches only
    #[serde(default)]
    pub renderer: Option<RendererConfig>,

    #[serde(default)]
    pub answer: AnswerConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed (the seed itself is depth 0)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Total page budget for one crawl, across all depths
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Number of pages fetched concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Timeout for the plain HTTP fetch (milliseconds)
    #[serde(rename = "static-timeout-ms", default = "default_static_timeout_ms")]
    pub static_timeout_ms: u64,

    /// Timeout for the rendered fallback fetch (milliseconds)
    #[serde(rename = "render-timeout-ms", default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Overall deadline for one crawl; partial results are returned when it fires
    #[serde(rename = "crawl-timeout-secs", default)]
    pub crawl_timeout_secs: Option<u64>,

    /// Same-host or same-host-plus-subdomains link following
    #[serde(default)]
    pub scope: ScopeMode,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteGleaner".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://crates.io/crates/sitegleaner".to_string(),
        }
    }
}

/// WebDriver endpoint used for the rendered fallback
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RendererConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_true")]
    pub headless: bool,
}

/// Chat completion service used to answer questions about crawled pages
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnswerConfig {
    pub api_base: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1/".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.5,
            max_tokens: 800,
        }
    }
}

/// Retention policy for shared conversations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StoreConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            capacity: 1024,
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_pages() -> usize {
    5
}

fn default_workers() -> usize {
    4
}

fn default_static_timeout_ms() -> u64 {
    5_000
}

fn default_render_timeout_ms() -> u64 {
    30_000
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_true() -> bool {
    true
}
