//! Configuration module for SiteGleaner
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitegleaner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitegleaner.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnswerConfig, Config, CrawlerConfig, RendererConfig, StoreConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::{MAX_PAGE_BUDGET, MAX_WORKERS};
