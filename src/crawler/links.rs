//! Same-site link resolution
//!
//! This module pulls anchor targets out of a page, resolves them against the
//! page URL, and keeps only the ones that stay on the seed's site.

use crate::url::SiteScope;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Pseudo-schemes that never point at a fetchable web page
const NON_NAVIGABLE_PREFIXES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

/// Resolves links found on crawled pages to absolute, in-scope URLs
#[derive(Debug, Clone)]
pub struct LinkResolver {
    scope: SiteScope,
}

impl LinkResolver {
    /// Creates a resolver that only keeps links inside `scope`
    pub fn new(scope: SiteScope) -> Self {
        Self { scope }
    }

    /// Extracts every in-scope link from `html`
    ///
    /// # Link Rules
    ///
    /// **Include:**
    /// - `<a href="...">` targets, resolved against `base_url`
    ///
    /// **Exclude:**
    /// - `javascript:`, `mailto:`, `tel:` and `data:` targets
    /// - fragment-only targets (same-page anchors)
    /// - hrefs that fail to resolve, or resolve to a non-HTTP(S) URL
    /// - URLs whose host is outside the seed's scope
    ///
    /// Fragments are stripped from the resolved URLs. The returned list is
    /// deduplicated and keeps the order in which links first appear.
    ///
    /// # Example
    ///
    /// ```
    /// use sitegleaner::crawler::LinkResolver;
    /// use sitegleaner::url::{ScopeMode, SiteScope};
    /// use url::Url;
    ///
    /// let base = Url::parse("https://example.com/x/y").unwrap();
    /// let resolver = LinkResolver::new(SiteScope::new(&base, ScopeMode::ExactHost).unwrap());
    ///
    /// let html = r#"<a href="/about">About</a><a href="https://other.com/page">Other</a>"#;
    /// let links = resolver.resolve(html, &base);
    /// assert_eq!(links.len(), 1);
    /// assert_eq!(links[0].as_str(), "https://example.com/about");
    /// ```
    pub fn resolve(&self, html: &str, base_url: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);
        let Ok(a_selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&a_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            let Some(url) = resolve_href(href, base_url) else {
                continue;
            };

            if !self.scope.contains(&url) {
                continue;
            }

            if seen.insert(url.as_str().to_string()) {
                links.push(url);
            }
        }

        links
    }
}

/// Resolves one href to an absolute HTTP(S) URL without a fragment
fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if NON_NAVIGABLE_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute)
}
