//! HTTP fetcher implementation
//!
//! This module defines the fetch client capability the crawl core depends on
//! and its `reqwest` implementation:
//! - Building HTTP clients with the configured browser user agent
//! - Per-request headers and key/value context
//! - A derived-filename accessor on completed responses
//! - Error classification (HTTP status vs. network failure)

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::signer::apply_signature;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Marks requests as XHR, as the web client does
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";

/// Profile page the request claims to originate from
pub const REFERRER_HEADER: &str = "Referrer";

/// Errors raised while fetching a URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },
}

impl FetchError {
    /// Response body, when the server sent one
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Key/value context carried from a page to the requests it triggers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// JSON request variables of a pagination request
    pub variables: Option<String>,

    /// Integrity signature seed, present only while the mechanism is active
    pub signature_seed: Option<String>,
}

/// An outbound GET request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub context: RequestContext,
}

impl FetchRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
            context: RequestContext::default(),
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Sets a header, replacing any existing value with the same name
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A completed response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: Url,
    pub status: u16,
    /// Content-Type header value (empty when absent)
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Filename this response is stored under
    pub fn file_name(&self) -> String {
        crate::url::derive_filename(&self.url, self.content_disposition.as_deref())
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_json(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("json")
    }
}

/// Capability the crawl core needs from an HTTP client
#[async_trait]
pub trait FetchClient: Send + Sync {
    /// Issues a GET and returns the raw response
    ///
    /// Non-success statuses are reported as [`FetchError::Http`].
    async fn get(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Stamps the headers every outbound request carries
///
/// Adds `X-Requested-With` and `Referrer`, then the integrity signature when the
/// request context holds a seed.
pub fn prepare_request(request: &mut FetchRequest, referrer: &str) {
    request.set_header(REQUESTED_WITH_HEADER, "XMLHttpRequest");
    request.set_header(REFERRER_HEADER, referrer);
    apply_signature(request);
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Timeout settings
/// * `user_agent` - The browser user agent string to present
///
/// # Example
///
/// ```no_run
/// use ig_harvest::config::Config;
/// use ig_harvest::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.value.clone())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed fetch client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(crawler, user_agent)?))
    }
}

#[async_trait]
impl FetchClient for HttpFetcher {
    async fn get(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = request.url.to_string();
        let mut builder = self.client.get(request.url.clone());

        for (name, value) in &request.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            builder = builder.header(header_name, header_value);
        }

        tracing::trace!("GET {}", url);
        let response = builder.send().await.map_err(|source| FetchError::Network {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let final_url = response.url().clone();
        let content_type = header_string(response.headers(), CONTENT_TYPE).unwrap_or_default();
        let content_disposition = header_string(response.headers(), CONTENT_DISPOSITION);

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Network {
                url: url.clone(),
                source,
            })?
            .to_vec();

        if !status.is_success() {
            return Err(FetchError::Http {
                url,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(FetchResponse {
            url: final_url,
            status: status.as_u16(),
            content_type,
            content_disposition,
            body,
        })
    }
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
