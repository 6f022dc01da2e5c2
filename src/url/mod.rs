//! URL handling module for IG-Harvest
//!
//! This module builds the profile, pagination and referrer URLs for an
//! account, and derives artifact filenames from response URLs.

mod filename;

pub use filename::{derive_filename, sanitize_filename};

use crate::state::Account;
use url::Url;

/// Path of the stored-query GraphQL endpoint
const GRAPHQL_PATH: &str = "/graphql/query/";

/// Returns `<base>/<account>`, the landing page of a profile
///
/// # Examples
///
/// ```
/// use ig_harvest::state::Account;
/// use ig_harvest::url::profile_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.instagram.com").unwrap();
/// let url = profile_url(&base, &Account::new("alice")).unwrap();
/// assert_eq!(url.as_str(), "https://www.instagram.com/alice");
/// ```
pub fn profile_url(base: &Url, account: &Account) -> Result<Url, url::ParseError> {
    Url::parse(&referrer(base, account))
}

/// Value of the `Referrer` header sent with every request for `account`
pub fn referrer(base: &Url, account: &Account) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), account.as_str())
}

/// Builds a pagination request URL
///
/// `variables` is the raw JSON document; it is percent-encoded here.
///
/// # Examples
///
/// ```
/// use ig_harvest::url::graphql_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.instagram.com").unwrap();
/// let url = graphql_url(&base, "abc", r#"{"id":"1"}"#).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.instagram.com/graphql/query/?query_hash=abc&variables=%7B%22id%22%3A%221%22%7D"
/// );
/// ```
pub fn graphql_url(base: &Url, query_id: &str, variables: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}{}?query_hash={}&variables={}",
        base.as_str().trim_end_matches('/'),
        GRAPHQL_PATH,
        urlencoding::encode(query_id),
        urlencoding::encode(variables)
    ))
}

/// Resolves a possibly relative asset reference against the page it came from
pub fn resolve_asset(page_url: &Url, href: &str) -> Result<Url, url::ParseError> {
    page_url.join(href.trim())
}
