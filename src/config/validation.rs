use crate::config::types::{
    AnswerConfig, Config, CrawlerConfig, RendererConfig, StoreConfig, UserAgentConfig,
};
use crate::url::parse_http_url;
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound on the page budget of a single crawl
pub const MAX_PAGE_BUDGET: usize = 10_000;

/// Upper bound on concurrent page workers
pub const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    if let Some(renderer) = &config.renderer {
        validate_renderer_config(renderer)?;
    }
    validate_answer_config(&config.answer)?;
    validate_store_config(&config.store)?;
    Ok(())
}

/// Validates seed URLs
fn validate_seeds(seeds: &[String]) -> ConfigResult<()> {
    for seed in seeds {
        parse_http_url(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    // max_depth >= 0 is always true for u32; depth 0 means "seed only"

    if config.max_pages < 1 || config.max_pages > MAX_PAGE_BUDGET {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGE_BUDGET, config.max_pages
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.static_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "static_timeout_ms must be >= 100ms, got {}ms",
            config.static_timeout_ms
        )));
    }

    if config.render_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "render_timeout_ms must be >= 1000ms, got {}ms",
            config.render_timeout_ms
        )));
    }

    if config.crawl_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "crawl_timeout_secs must be positive when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_renderer_config(config: &RendererConfig) -> ConfigResult<()> {
    parse_http_url(&config.webdriver_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webdriver_url: {}", e)))?;
    Ok(())
}

fn validate_answer_config(config: &AnswerConfig) -> ConfigResult<()> {
    parse_http_url(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            config.temperature
        )));
    }

    if config.max_tokens < 1 {
        return Err(ConfigError::Validation(
            "max_tokens must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> ConfigResult<()> {
    if config.ttl_secs < 1 {
        return Err(ConfigError::Validation(
            "store ttl_secs must be >= 1".to_string(),
        ));
    }

    if config.capacity < 1 {
        return Err(ConfigError::Validation(
            "store capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}
