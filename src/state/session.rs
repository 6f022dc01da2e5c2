//! Per-account crawl session state

use std::fmt;

/// Opaque profile handle, one per line of the account list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Account(String);

impl Account {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of this account's artifact directory under the image root
    pub fn output_dir_name(&self) -> String {
        format!("instagram_{}", self.0)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mutable state of one account's crawl
///
/// Created when the account's crawl starts and dropped when it ends. Nothing
/// here is shared across accounts.
#[derive(Debug, Clone)]
pub struct CrawlSession {
    pub account: Account,

    /// Stored-query identifier; resolved once and reused for every page
    query_id: Option<String>,

    /// The profile's internal numeric identity, known after the first page
    pub subject_id: Option<String>,

    /// Continuation token; `None` means "start of feed"
    pub cursor: Option<String>,

    /// Whether the upstream reported more pages after `cursor`
    pub has_more: bool,

    /// Seed for the integrity header, issued by the initial page only when active
    pub signature_seed: Option<String>,
}

impl CrawlSession {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            query_id: None,
            subject_id: None,
            cursor: None,
            has_more: true,
            signature_seed: None,
        }
    }

    pub fn query_id(&self) -> Option<&str> {
        self.query_id.as_deref()
    }

    /// Records the resolved query identifier
    ///
    /// Returns false and keeps the existing value if one was already set.
    pub fn set_query_id(&mut self, query_id: String) -> bool {
        if self.query_id.is_some() {
            tracing::warn!(
                "[{}] query identifier already resolved, ignoring new value",
                self.account
            );
            return false;
        }
        self.query_id = Some(query_id);
        true
    }
}
