//! HTML content extraction
//!
//! Turns raw HTML into a [`PageSummary`]: the page title, its top-level
//! headings, and a bounded, whitespace-normalized excerpt of the main content.
//! Extraction never fails; sparse or malformed HTML simply yields empty fields.

use scraper::{Html, Selector};
use serde::Serialize;

/// Maximum number of characters kept in [`PageSummary::content_summary`]
pub const CONTENT_SUMMARY_CHARS: usize = 1000;

/// Content regions tried in priority order; the first non-empty one wins
const CONTENT_REGIONS: [&str; 3] = ["main", "article", "body"];

pub const NO_TITLE: &str = "No title found";
pub const NO_H1: &str = "No h1 found";
pub const NO_H2: &str = "No h2 found";

/// Structured content extracted from a successfully fetched page
///
/// Missing values are kept as `None` / empty vectors. The `display_*` helpers
/// convert them to human-readable placeholders at the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub title: Option<String>,
    pub headings_h1: Vec<String>,
    pub headings_h2: Vec<String>,
    pub content_summary: String,
}

impl PageSummary {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(NO_TITLE)
    }

    pub fn display_h1(&self) -> String {
        join_or(&self.headings_h1, NO_H1)
    }

    pub fn display_h2(&self) -> String {
        join_or(&self.headings_h2, NO_H2)
    }
}

fn join_or(headings: &[String], placeholder: &str) -> String {
    if headings.is_empty() {
        placeholder.to_string()
    } else {
        headings.join(", ")
    }
}

/// Extracts a [`PageSummary`] from raw HTML
///
/// # Extraction Rules
///
/// - **Title**: trimmed text of the first `<title>`; `None` if missing or blank
/// - **Headings**: text of every `<h1>` and, separately, every `<h2>`, in
///   document order, with whitespace runs collapsed to one space; blank
///   headings are dropped
/// - **Content**: text of `<main>`, else `<article>`, else `<body>` (first
///   region that is non-empty after trimming), with every whitespace run
///   collapsed to one space and hard-capped at [`CONTENT_SUMMARY_CHARS`]
///   characters
///
/// The URL is passed through unchanged.
///
/// # Example
///
/// ```
/// use sitegleaner::crawler::extract;
///
/// let html = r#"<html><head><title> Docs </title></head>
///     <body><h1>Guide</h1><main>  Hello
///     world  </main></body></html>"#;
/// let summary = extract("https://example.com/", html);
/// assert_eq!(summary.title.as_deref(), Some("Docs"));
/// assert_eq!(summary.headings_h1, vec!["Guide".to_string()]);
/// assert_eq!(summary.content_summary, "Hello world");
/// ```
pub fn extract(url: &str, html: &str) -> PageSummary {
    let document = Html::parse_document(html);

    PageSummary {
        url: url.to_string(),
        title: extract_title(&document),
        headings_h1: extract_headings(&document, "h1"),
        headings_h2: extract_headings(&document, "h2"),
        content_summary: extract_content(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_headings(document: &Html, tag: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(tag) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
        .collect()
}

fn extract_content(document: &Html) -> String {
    for region in CONTENT_REGIONS {
        let text = region_text(document, region);
        if !text.is_empty() {
            return truncate_chars(&text, CONTENT_SUMMARY_CHARS);
        }
    }
    String::new()
}

/// Normalized text of every element matching `tag`, concatenated
fn region_text(document: &Html, tag: &str) -> String {
    let Ok(selector) = Selector::parse(tag) else {
        return String::new();
    };

    let raw: Vec<String> = document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .collect();

    collapse_whitespace(&raw.join(" "))
}

/// Collapses every run of whitespace (including newlines) into one space
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the first `max` characters, regardless of word boundaries
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
