/// Page state definitions for tracking crawl progress
///
/// Every URL a crawl discovers moves through
/// `Pending -> Fetching -> {Succeeded, Failed}`. There is no retry: a failed
/// page is recorded once and never revisited within the same crawl.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    // ===== Active States =====
    /// Page has been discovered and sits in the frontier
    Pending,

    /// Page has been claimed (counted against the budget) and is being fetched
    Fetching,

    // ===== Terminal States =====
    /// Page was fetched and extracted
    Succeeded,

    /// Page could not be fetched
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true once the page has been claimed for fetching
    ///
    /// A visited page is never scheduled again.
    pub fn is_visited(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Succeeded)
                | (Self::Fetching, Self::Failed)
        )
    }

    /// Short lowercase name used in logs and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
