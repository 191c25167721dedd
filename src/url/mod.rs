//! URL handling module for SiteGleaner
//!
//! This module provides seed URL validation, host extraction, and the
//! same-site scope check that keeps a crawl from drifting onto other domains.

mod domain;
mod matcher;

use serde::{Deserialize, Serialize};
use url::Url;

// Re-export main functions
pub use domain::{extract_host, parse_http_url};
pub use matcher::host_matches;

/// How far a crawl may wander away from the seed's host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    /// Only URLs whose host is exactly the seed's host
    #[default]
    ExactHost,
    /// The seed's host and any of its subdomains
    Subdomains,
}

/// The set of hosts a single crawl is allowed to visit
///
/// The scope is always anchored to the **seed's** host, never to the page a
/// link was found on, so a chain of links cannot drift across domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    seed_host: String,
    mode: ScopeMode,
}

impl SiteScope {
    /// Creates a scope anchored to the host of `seed`
    ///
    /// Returns None if the seed has no host.
    pub fn new(seed: &Url, mode: ScopeMode) -> Option<Self> {
        let seed_host = extract_host(seed)?;
        Some(Self { seed_host, mode })
    }

    /// The host every in-scope URL is compared against
    pub fn seed_host(&self) -> &str {
        &self.seed_host
    }

    /// Returns true if the URL's host falls inside this scope
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use sitegleaner::url::{ScopeMode, SiteScope};
    ///
    /// let seed = Url::parse("https://example.com/").unwrap();
    /// let scope = SiteScope::new(&seed, ScopeMode::ExactHost).unwrap();
    ///
    /// assert!(scope.contains(&Url::parse("https://example.com/about").unwrap()));
    /// assert!(!scope.contains(&Url::parse("https://other.com/page").unwrap()));
    /// ```
    pub fn contains(&self, url: &Url) -> bool {
        match extract_host(url) {
            Some(host) => host_matches(self.mode, &self.seed_host, &host),
            None => false,
        }
    }
}
