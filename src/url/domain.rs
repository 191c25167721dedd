use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and validates an absolute HTTP(S) URL
///
/// Anything that is not an absolute `http://` or `https://` URL with a host is
/// rejected. This runs before any network I/O so that invalid input never
/// reaches the fetcher.
///
/// # Examples
///
/// ```
/// use sitegleaner::url::parse_http_url;
///
/// assert!(parse_http_url("https://example.com/docs").is_ok());
/// assert!(parse_http_url("ftp://example.com/").is_err());
/// assert!(parse_http_url("/relative/path").is_err());
/// ```
pub fn parse_http_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost),
    }
}

/// Extracts the lowercase host from a URL, without the port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitegleaner::url::extract_host;
///
/// let url = Url::parse("https://Blog.Example.COM:8443/post").unwrap();
/// assert_eq!(extract_host(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
