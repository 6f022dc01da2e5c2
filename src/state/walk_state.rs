//! Pagination state definitions for one account's crawl

use std::fmt;

/// Position of the cursor walker for one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WalkState {
    /// No page has been decoded yet
    #[default]
    Initial,

    /// At least one page was walked and a continuation cursor is live
    Paging,

    /// Terminal: the feed is exhausted or the session was aborted
    Done,
}

impl WalkState {
    /// Returns true if no further requests may be issued
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Paging => "paging",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for WalkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
