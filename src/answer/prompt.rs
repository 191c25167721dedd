use crate::crawler::PageSummary;
use serde::Serialize;

/// Characters of page content shown as a source snippet
pub const SNIPPET_CHARS: usize = 200;

/// A page the answer was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    /// 1-based position, matching the `Source [i]` label in the prompt
    pub index: usize,
    pub url: String,
    pub title: String,
    pub snippet: String,
}

pub fn source_refs(pages: &[&PageSummary]) -> Vec<SourceRef> {
    pages
        .iter()
        .enumerate()
        .map(|(i, page)| SourceRef {
            index: i + 1,
            url: page.url.clone(),
            title: page.display_title().to_string(),
            snippet: page.content_summary.chars().take(SNIPPET_CHARS).collect(),
        })
        .collect()
}

/// Numbered source blocks separated by a blank line
pub fn build_context(pages: &[&PageSummary]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            format!(
                "Source [{}]: {}\nTitle: {}\nContent: {}",
                i + 1,
                page.url,
                page.display_title(),
                page.content_summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a helpful assistant. Based on the content below, answer the user's question \
         in a clean, paragraph-style summary that is clear and easy to read. Do not just list \
         bullet points. Write in natural, human-like English.\n\n\
         {}\n\n\
         Question: {}\n\
         Answer (clear and concise):",
        context,
        question.trim()
    )
}
