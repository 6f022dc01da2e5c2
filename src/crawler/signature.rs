//! Query identifier resolution
//!
//! Pagination requests name a stored query by a 32-character identifier that is
//! only published inside the profile page's script bundle. The resolver finds
//! the bundle link on the landing page, fetches it and hands the body to a
//! [`QueryIdExtractor`].
//!
//! The default extractor takes the *second* `queryId:"…"` token in the bundle.
//! That choice is empirical: the first token has been observed to belong to an
//! unrelated query. It depends on the upstream bundle layout and will break when
//! that changes; swap the extractor rather than patching callers.

use crate::crawler::fetcher::{prepare_request, FetchClient, FetchRequest};
use crate::{HarvestError, Result};
use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;
use url::Url;

/// Token pattern of a query identifier inside the script bundle
pub const QUERY_ID_PATTERN: &str = r#"queryId:"(.{32})""#;

/// Strategy for picking the query identifier out of a script body
pub trait QueryIdExtractor: Send + Sync + fmt::Debug {
    /// Returns the identifier, or the number of candidates seen when none qualifies
    fn extract(&self, script: &str) -> std::result::Result<String, usize>;
}

/// Picks the n-th (zero-based) capture of a pattern
#[derive(Debug, Clone)]
pub struct NthMatchExtractor {
    pattern: Regex,
    index: usize,
}

impl NthMatchExtractor {
    pub fn new(pattern: &str, index: usize) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            index,
        })
    }

    /// The observed-good strategy: second `queryId:"…"` token
    pub fn second_query_id() -> std::result::Result<Self, regex::Error> {
        Self::new(QUERY_ID_PATTERN, 1)
    }
}

impl QueryIdExtractor for NthMatchExtractor {
    fn extract(&self, script: &str) -> std::result::Result<String, usize> {
        let candidates: Vec<&str> = self
            .pattern
            .captures_iter(script)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();

        candidates
            .get(self.index)
            .map(|id| id.to_string())
            .ok_or(candidates.len())
    }
}

/// Finds the script bundle referenced by a profile page
///
/// Looks for the first `<link as="script" href="…">` and resolves it against
/// the page URL.
pub fn locate_script_asset(html: &str, page_url: &Url) -> Result<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"link[as="script"][href]"#).map_err(|e| {
        HarvestError::decode("profile page", format!("bad script selector: {:?}", e))
    })?;

    let href = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .find(|href| !href.trim().is_empty())
        .ok_or_else(|| HarvestError::ScriptAssetMissing {
            url: page_url.to_string(),
        })?;

    Ok(crate::url::resolve_asset(page_url, href)?)
}

/// Resolves the session's query identifier
pub struct SignatureResolver {
    extractor: Box<dyn QueryIdExtractor>,
}

impl SignatureResolver {
    pub fn new(extractor: Box<dyn QueryIdExtractor>) -> Self {
        Self { extractor }
    }

    /// Resolver using [`NthMatchExtractor::second_query_id`]
    pub fn with_default_strategy() -> std::result::Result<Self, regex::Error> {
        Ok(Self::new(Box::new(NthMatchExtractor::second_query_id()?)))
    }

    /// Picks the identifier out of an already fetched script body
    pub fn extract(&self, script_url: &Url, script: &str) -> Result<String> {
        self.extractor
            .extract(script)
            .map_err(|matches| HarvestError::SignatureNotFound {
                script_url: script_url.to_string(),
                matches,
            })
    }

    /// Fetches the script bundle linked from `html` and extracts the identifier
    ///
    /// # Arguments
    ///
    /// * `client` - Fetch client used for the bundle request
    /// * `html` - The profile landing page body
    /// * `page_url` - URL the landing page was served from
    /// * `referrer` - Referrer header value for the account
    pub async fn resolve(
        &self,
        client: &dyn FetchClient,
        html: &str,
        page_url: &Url,
        referrer: &str,
    ) -> Result<String> {
        let script_url = locate_script_asset(html, page_url)?;
        tracing::debug!("Fetching script bundle {}", script_url);

        let mut request = FetchRequest::new(script_url.clone());
        prepare_request(&mut request, referrer);
        let response = client.get(request).await?;

        self.extract(&script_url, &response.text())
    }
}

impl fmt::Debug for SignatureResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureResolver")
            .field("extractor", &self.extractor)
            .finish()
    }
}
