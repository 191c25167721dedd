//! Turning crawl results into a chat answer
//!
//! Successful pages become numbered sources in a prompt; failed pages are left
//! out of the prompt and reported alongside the answer instead. A crawl where
//! every page failed has nothing to answer from and is reported as
//! [`AnswerError::NoContent`].

mod client;
mod prompt;

pub use client::{ChatCompletionsClient, NO_ANSWER};
pub use prompt::{build_context, build_prompt, source_refs, SourceRef, SNIPPET_CHARS};

use crate::crawler::{PageFailure, PageResult, PageSummary};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while answering a question
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("Failed to scrape any content.")]
    NoContent,

    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("invalid API base URL {0}")]
    InvalidBase(String),

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion service returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// A text completion backend
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AnswerError>;
}

/// An answer together with the pages it was drawn from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// Pages that could not be fetched and were left out of the prompt
    pub failures: Vec<PageFailure>,
}

/// Answers `question` from the successful pages in `results`
pub async fn answer_question(
    service: &dyn AnswerService,
    question: &str,
    results: &[PageResult],
) -> Result<ChatAnswer, AnswerError> {
    if question.trim().is_empty() {
        return Err(AnswerError::EmptyQuestion);
    }

    let pages: Vec<&PageSummary> = results.iter().filter_map(PageResult::as_success).collect();
    if pages.is_empty() {
        return Err(AnswerError::NoContent);
    }

    let failures: Vec<PageFailure> = results
        .iter()
        .filter_map(PageResult::as_failure)
        .cloned()
        .collect();

    tracing::info!(
        "Answering from {} pages ({} failed pages dropped)",
        pages.len(),
        failures.len()
    );

    let prompt = build_prompt(question, &build_context(&pages));
    let answer = service.complete(&prompt).await?;

    Ok(ChatAnswer {
        answer,
        sources: source_refs(&pages),
        failures,
    })
}
