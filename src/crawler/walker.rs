//! Cursor walker: the per-account pagination state machine
//!
//! ```text
//!   Initial --start(first page)--> Paging --advance(page)--> Paging
//!      |                             |
//!      +------ has_next = false -----+----> Done
//! ```
//!
//! For every page the walker emits one `FetchImage` per still image, in page
//! order, followed by at most one `FetchNextPage`. Only one cursor is live at
//! a time; after `Done` nothing more is emitted for the account.

use crate::crawler::decoder::{InitialPage, PageResult};
use crate::state::{CrawlSession, WalkState};
use crate::{HarvestError, Result};
use serde::Serialize;
use url::Url;

/// Variables document of a pagination request, serialized in field order
#[derive(Debug, Serialize)]
struct PageVariables<'a> {
    id: &'a str,
    first: u32,
    after: &'a str,
}

/// Serializes `{"id":…,"first":…,"after":…}`
///
/// # Examples
///
/// ```
/// use ig_harvest::crawler::page_variables;
///
/// assert_eq!(
///     page_variables("123", 50, "AB").unwrap(),
///     r#"{"id":"123","first":50,"after":"AB"}"#
/// );
/// ```
pub fn page_variables(subject_id: &str, first: u32, after: &str) -> Result<String> {
    serde_json::to_string(&PageVariables {
        id: subject_id,
        first,
        after,
    })
    .map_err(|e| HarvestError::decode("request variables", e.to_string()))
}

/// A pagination request built by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: Url,
    /// Unescaped JSON variables, needed by the integrity signer
    pub variables: String,
}

/// Work the walker asks the coordinator to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkAction {
    FetchImage(Url),
    FetchNextPage(PageRequest),
}

/// Pagination state machine for one account
#[derive(Debug, Clone)]
pub struct CursorWalker {
    state: WalkState,
    base_url: Url,
    page_size: u32,
    pages_walked: usize,
}

impl CursorWalker {
    pub fn new(base_url: Url, page_size: u32) -> Self {
        Self {
            state: WalkState::Initial,
            base_url,
            page_size,
            pages_walked: 0,
        }
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn pages_walked(&self) -> usize {
        self.pages_walked
    }

    /// Walks the first page: `Initial -> Paging | Done`
    ///
    /// Captures the subject id and signature seed into the session.
    pub fn start(
        &mut self,
        session: &mut CrawlSession,
        initial: InitialPage,
    ) -> Result<Vec<WalkAction>> {
        if self.state != WalkState::Initial {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                event: "start",
            });
        }

        session.subject_id = Some(initial.subject_id);
        session.signature_seed = initial.signature_seed;
        self.walk(session, &initial.page)
    }

    /// Walks a subsequent page: `Paging -> Paging | Done`
    pub fn advance(&mut self, session: &mut CrawlSession, page: &PageResult) -> Result<Vec<WalkAction>> {
        if self.state != WalkState::Paging {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                event: "advance",
            });
        }

        self.walk(session, page)
    }

    /// Ends the walk after a fatal error
    pub fn abort(&mut self, session: &mut CrawlSession) {
        if !self.state.is_terminal() {
            tracing::debug!("[{}] walk aborted in state {}", session.account, self.state);
        }
        self.finish(session);
    }

    fn finish(&mut self, session: &mut CrawlSession) {
        self.state = WalkState::Done;
        session.has_more = false;
    }

    fn walk(&mut self, session: &mut CrawlSession, page: &PageResult) -> Result<Vec<WalkAction>> {
        let mut actions: Vec<WalkAction> = page
            .images()
            .map(|record| WalkAction::FetchImage(record.image_url.clone()))
            .collect();
        self.pages_walked += 1;

        let cursor = match (page.has_next(), page.next_cursor()) {
            (true, Some(cursor)) => cursor,
            _ => {
                tracing::debug!(
                    "[{}] feed exhausted after {} page(s)",
                    session.account,
                    self.pages_walked
                );
                session.cursor = None;
                self.finish(session);
                return Ok(actions);
            }
        };

        let request = self.next_request(session, cursor)?;
        session.cursor = Some(cursor.to_string());
        session.has_more = true;
        self.state = WalkState::Paging;
        actions.push(WalkAction::FetchNextPage(request));
        Ok(actions)
    }

    fn next_request(&self, session: &CrawlSession, cursor: &str) -> Result<PageRequest> {
        let subject_id = session.subject_id.as_deref().ok_or_else(|| {
            HarvestError::decode("pagination", "subject id unknown before first page")
        })?;
        let query_id = session
            .query_id()
            .ok_or_else(|| HarvestError::SignatureNotFound {
                script_url: "(unresolved)".to_string(),
                matches: 0,
            })?;

        let variables = page_variables(subject_id, self.page_size, cursor)?;
        let url = crate::url::graphql_url(&self.base_url, query_id, &variables)?;
        Ok(PageRequest { url, variables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::decoder::{MediaRecord, PageInfo};
    use crate::state::Account;
    use chrono::{TimeZone, Utc};

    const QUERY_ID: &str = "0123456789abcdef0123456789abcdef";

    fn record(name: &str, is_video: bool) -> MediaRecord {
        let url = Url::parse(&format!("https://cdn.example.com/{}", name)).unwrap();
        MediaRecord {
            image_url: url.clone(),
            thumbnail_url: url,
            is_video,
            captured_at: Utc.timestamp_opt(1522000000, 0).unwrap(),
            width: 1080,
            height: 1080,
        }
    }

    fn page(records: Vec<MediaRecord>, cursor: Option<&str>) -> PageResult {
        PageResult {
            records,
            page_info: PageInfo {
                end_cursor: cursor.map(str::to_string),
                has_next: cursor.is_some(),
            },
        }
    }

    fn session() -> CrawlSession {
        let mut session = CrawlSession::new(Account::new("alice"));
        session.set_query_id(QUERY_ID.to_string());
        session
    }

    fn walker() -> CursorWalker {
        CursorWalker::new(Url::parse("https://www.instagram.com").unwrap(), 50)
    }

    fn next_pages(actions: &[WalkAction]) -> Vec<&PageRequest> {
        actions
            .iter()
            .filter_map(|a| match a {
                WalkAction::FetchNextPage(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_alice_scenario() {
        let mut session = session();
        let mut walker = walker();
        let initial = InitialPage {
            subject_id: "123".to_string(),
            page: page(
                vec![
                    record("a.jpg", false),
                    record("v.jpg", true),
                    record("b.jpg", false),
                ],
                Some("AB"),
            ),
            signature_seed: None,
        };

        let actions = walker.start(&mut session, initial).unwrap();

        assert_eq!(actions.len(), 3);
        assert_eq!(
            actions[0],
            WalkAction::FetchImage(Url::parse("https://cdn.example.com/a.jpg").unwrap())
        );
        assert_eq!(
            actions[1],
            WalkAction::FetchImage(Url::parse("https://cdn.example.com/b.jpg").unwrap())
        );
        let requests = next_pages(&actions);
        assert_eq!(requests.len(), 1);
        assert!(matches!(actions[2], WalkAction::FetchNextPage(_)));
        assert_eq!(
            requests[0].variables,
            r#"{"id":"123","first":50,"after":"AB"}"#
        );
        assert!(requests[0].url.as_str().contains(QUERY_ID));
        assert_eq!(walker.state(), WalkState::Paging);
        assert_eq!(session.cursor.as_deref(), Some("AB"));
        assert_eq!(session.subject_id.as_deref(), Some("123"));

        let last = page(vec![record("c.jpg", false)], None);
        let actions = walker.advance(&mut session, &last).unwrap();

        assert_eq!(actions.len(), 1);
        assert!(next_pages(&actions).is_empty());
        assert_eq!(walker.state(), WalkState::Done);
        assert!(!session.has_more);
    }

    #[test]
    fn test_n_pages_build_n_minus_one_continuations() {
        let n = 5;
        let mut session = session();
        let mut walker = walker();

        let mut continuations = 0;
        let actions = walker
            .start(
                &mut session,
                InitialPage {
                    subject_id: "42".to_string(),
                    page: page(vec![record("p0.jpg", false)], Some("C0")),
                    signature_seed: None,
                },
            )
            .unwrap();
        continuations += next_pages(&actions).len();

        for i in 1..n {
            let cursor = format!("C{}", i);
            let has_next = i < n - 1;
            let p = page(
                vec![record(&format!("p{}.jpg", i), false)],
                has_next.then_some(cursor.as_str()),
            );
            let actions = walker.advance(&mut session, &p).unwrap();
            continuations += next_pages(&actions).len();
        }

        assert_eq!(continuations, n - 1);
        assert_eq!(walker.pages_walked(), n);
        assert_eq!(walker.state(), WalkState::Done);

        let extra = walker.advance(&mut session, &page(vec![record("x.jpg", false)], Some("Z")));
        assert!(matches!(
            extra,
            Err(HarvestError::InvalidTransition {
                from: WalkState::Done,
                ..
            })
        ));
    }

    #[test]
    fn test_single_page_feed() {
        let mut session = session();
        let mut walker = walker();
        let actions = walker
            .start(
                &mut session,
                InitialPage {
                    subject_id: "1".to_string(),
                    page: page(vec![record("a.jpg", false)], None),
                    signature_seed: Some("seed".to_string()),
                },
            )
            .unwrap();

        assert_eq!(actions.len(), 1);
        assert_eq!(walker.state(), WalkState::Done);
        assert_eq!(session.signature_seed.as_deref(), Some("seed"));
    }

    #[test]
    fn test_videos_never_fetched() {
        let mut session = session();
        let mut walker = walker();
        let actions = walker
            .start(
                &mut session,
                InitialPage {
                    subject_id: "1".to_string(),
                    page: page(vec![record("v1.mp4", true), record("v2.mp4", true)], None),
                    signature_seed: None,
                },
            )
            .unwrap();

        assert!(actions.is_empty());
    }

    #[test]
    fn test_advance_before_start_is_rejected() {
        let mut session = session();
        let mut walker = walker();
        let result = walker.advance(&mut session, &page(vec![], None));
        assert!(matches!(
            result,
            Err(HarvestError::InvalidTransition {
                from: WalkState::Initial,
                ..
            })
        ));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut session = session();
        let mut walker = walker();
        let initial = InitialPage {
            subject_id: "1".to_string(),
            page: page(vec![], Some("A")),
            signature_seed: None,
        };
        walker.start(&mut session, initial.clone()).unwrap();
        assert!(walker.start(&mut session, initial).is_err());
    }

    #[test]
    fn test_missing_query_id_fails_pagination() {
        let mut session = CrawlSession::new(Account::new("alice"));
        let mut walker = walker();
        let result = walker.start(
            &mut session,
            InitialPage {
                subject_id: "1".to_string(),
                page: page(vec![], Some("A")),
                signature_seed: None,
            },
        );
        assert!(matches!(result, Err(HarvestError::SignatureNotFound { .. })));
    }

    #[test]
    fn test_abort_is_terminal() {
        let mut session = session();
        let mut walker = walker();
        walker.abort(&mut session);
        assert_eq!(walker.state(), WalkState::Done);
        assert!(!session.has_more);
    }

    #[test]
    fn test_page_variables_escape_cursor() {
        let vars = page_variables("1", 50, r#"a"b"#).unwrap();
        assert_eq!(vars, r#"{"id":"1","first":50,"after":"a\"b"}"#);
    }
}
