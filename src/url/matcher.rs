use super::ScopeMode;

/// Checks whether a candidate host belongs to the seed's site
///
/// Two modes are supported:
/// 1. `ExactHost`: "example.com" matches only "example.com"
/// 2. `Subdomains`: "example.com" also matches "blog.example.com" and
///    "api.v2.example.com"
///
/// Both hosts are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use sitegleaner::url::{host_matches, ScopeMode};
///
/// assert!(host_matches(ScopeMode::ExactHost, "example.com", "example.com"));
/// assert!(!host_matches(ScopeMode::ExactHost, "example.com", "blog.example.com"));
///
/// assert!(host_matches(ScopeMode::Subdomains, "example.com", "blog.example.com"));
/// assert!(!host_matches(ScopeMode::Subdomains, "example.com", "myexample.com"));
/// ```
pub fn host_matches(mode: ScopeMode, seed_host: &str, candidate: &str) -> bool {
    if seed_host.is_empty() {
        return false;
    }

    match mode {
        ScopeMode::ExactHost => candidate == seed_host,
        ScopeMode::Subdomains => {
            candidate == seed_host
                || candidate
                    .strip_suffix(seed_host)
                    .is_some_and(|prefix| prefix.ends_with('.') && prefix.len() > 1)
        }
    }
}
