//! SiteGleaner: a bounded same-site crawler
//!
//! This crate crawls a site from a seed URL, bounded by depth and a total page
//! budget, extracts a short structured summary from every page it reaches, and
//! returns partial results even when individual pages fail. Thin boundary layers
//! turn those summaries into chat answers and keep shared conversations around
//! for a while.

pub mod answer;
pub mod api;
pub mod config;
pub mod crawler;
pub mod state;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for SiteGleaner operations
///
/// A crawl only ever fails for invalid input. Per-page fetch failures are data
/// in the returned results, never an error.
#[derive(Debug, Error)]
pub enum GleanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL: {0}")]
    InvalidSeed(#[from] UrlError),

    #[error("Invalid crawl budget: {0}")]
    InvalidBudget(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Answer error: {0}")]
    Answer(#[from] answer::AnswerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GleanError {
    /// Returns true if the error was caused by caller-supplied input
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidSeed(_) | Self::InvalidBudget(_))
    }
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
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for SiteGleaner operations
pub type Result<T> = std::result::Result<T, GleanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlRequest, Crawler, PageFailure, PageResult, PageSummary};
pub use state::PageState;
