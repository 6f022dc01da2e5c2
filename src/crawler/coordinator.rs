//! Crawler coordinator - one account's crawl session
//!
//! This module drives a single account from landing page to feed exhaustion:
//! - Fetching the profile page and resolving the session's query identifier
//! - Decoding the embedded first page and every GraphQL page after it
//! - Feeding pages to the cursor walker and executing its actions
//! - Downloading images concurrently into artifact storage
//!
//! Failures end the account's session and are reported in its
//! [`AccountReport`]; they never propagate to other accounts.

use crate::config::Config;
use crate::crawler::decoder::{decode_initial, decode_page};
use crate::crawler::fetcher::{
    prepare_request, FetchClient, FetchRequest, HttpFetcher, RequestContext,
};
use crate::crawler::signature::SignatureResolver;
use crate::crawler::walker::{CursorWalker, PageRequest, WalkAction};
use crate::output::{AccountOutcome, AccountReport};
use crate::state::{Account, CrawlSession};
use crate::storage::{accept_response, ArtifactStorage, FsArtifactStorage, StoreOutcome};
use crate::{HarvestError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Result of one image download task
#[derive(Debug)]
enum DownloadResult {
    Stored(StoreOutcome),
    Failed,
}

/// Drives crawl sessions against one upstream
pub struct Coordinator {
    client: Arc<dyn FetchClient>,
    storage: Arc<dyn ArtifactStorage>,
    resolver: SignatureResolver,
    base_url: Url,
    page_size: u32,
    download_permits: Arc<Semaphore>,
}

impl Coordinator {
    /// Creates a coordinator over the given fetch client and storage
    ///
    /// # Arguments
    ///
    /// * `config` - Crawler settings (base URL, page size, download concurrency)
    /// * `client` - The fetch client used for every request
    /// * `storage` - Where downloaded images are persisted
    pub fn new(
        config: &Config,
        client: Arc<dyn FetchClient>,
        storage: Arc<dyn ArtifactStorage>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            storage,
            resolver: SignatureResolver::with_default_strategy()?,
            base_url: Url::parse(&config.crawler.base_url)?,
            page_size: config.crawler.page_size,
            download_permits: Arc::new(Semaphore::new(
                config.crawler.max_concurrent_downloads.max(1) as usize,
            )),
        })
    }

    /// Creates a coordinator with the HTTP client and filesystem storage
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpFetcher::from_config(&config.crawler, &config.user_agent)?;
        let storage = FsArtifactStorage::new(&config.output.image_dir, &config.output.log_dir);
        Self::new(config, Arc::new(client), Arc::new(storage))
    }

    /// Replaces the query identifier resolution strategy
    pub fn with_resolver(mut self, resolver: SignatureResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Crawls one account until its feed is exhausted or the session fails
    ///
    /// All image downloads started for the account have finished when this
    /// returns.
    pub async fn crawl_account(&self, account: &Account) -> AccountReport {
        let started = Instant::now();
        let mut report = AccountReport::new(account.clone());
        let mut session = CrawlSession::new(account.clone());
        let mut walker = CursorWalker::new(self.base_url.clone(), self.page_size);
        let mut downloads = JoinSet::new();

        tracing::info!("[{}] Crawl started", account);

        let result = self
            .run_session(&mut session, &mut walker, &mut downloads, &mut report)
            .await;

        report.outcome = match result {
            Ok(()) => AccountOutcome::Completed,
            Err(HarvestError::Fetch(e)) => {
                walker.abort(&mut session);
                tracing::error!(
                    "[{}] error: {} {}",
                    account,
                    e,
                    e.body().unwrap_or_default()
                );
                AccountOutcome::Abandoned {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                walker.abort(&mut session);
                tracing::error!("[{}] crawl failed: {}", account, e);
                AccountOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        while let Some(joined) = downloads.join_next().await {
            match joined {
                Ok(DownloadResult::Stored(StoreOutcome::Saved(_))) => report.images_saved += 1,
                Ok(DownloadResult::Stored(StoreOutcome::Duplicate { .. })) => {
                    report.duplicates += 1
                }
                Ok(DownloadResult::Stored(StoreOutcome::NotMedia { content_type })) => {
                    tracing::warn!(
                        "[{}] image request answered with {:?}, skipped",
                        account,
                        content_type
                    );
                    report.download_failures += 1;
                }
                Ok(DownloadResult::Failed) => report.download_failures += 1,
                Err(e) => {
                    tracing::error!("[{}] download task panicked: {}", account, e);
                    report.download_failures += 1;
                }
            }
        }

        report.pages_walked = walker.pages_walked();
        report.elapsed = started.elapsed();
        tracing::info!(
            "[{}] Crawl {}: {} page(s), {} new image(s), {} duplicate(s)",
            account,
            report.outcome,
            report.pages_walked,
            report.images_saved,
            report.duplicates
        );
        report
    }

    async fn run_session(
        &self,
        session: &mut CrawlSession,
        walker: &mut CursorWalker,
        downloads: &mut JoinSet<DownloadResult>,
        report: &mut AccountReport,
    ) -> Result<()> {
        let referrer = crate::url::referrer(&self.base_url, &session.account);
        let profile_url = crate::url::profile_url(&self.base_url, &session.account)?;

        let landing = self
            .client
            .get(self.request(profile_url, RequestContext::default(), &referrer))
            .await?;
        let html = landing.text();

        let query_id = self
            .resolver
            .resolve(self.client.as_ref(), &html, &landing.url, &referrer)
            .await?;
        tracing::debug!("[{}] query identifier {}", session.account, query_id);
        session.set_query_id(query_id);

        let initial = decode_initial(&html)?;
        report.videos_skipped += initial.page.video_count();
        let actions = walker.start(session, initial)?;
        let mut next = self.dispatch(actions, &session.account, &referrer, downloads, report);

        while let Some(page_request) = next {
            tracing::info!("[{}] Next page found {}", session.account, page_request.url);
            let context = RequestContext {
                variables: Some(page_request.variables),
                signature_seed: session.signature_seed.clone(),
            };

            let response = self
                .client
                .get(self.request(page_request.url, context, &referrer))
                .await?;
            if !response.is_json() {
                return Err(HarvestError::decode(
                    "api page",
                    format!("unexpected content type {:?}", response.content_type),
                ));
            }

            let page = decode_page(&response.body)?;
            report.videos_skipped += page.video_count();
            let actions = walker.advance(session, &page)?;
            next = self.dispatch(actions, &session.account, &referrer, downloads, report);
        }

        Ok(())
    }

    /// Starts image downloads and returns the next page request, if any
    fn dispatch(
        &self,
        actions: Vec<WalkAction>,
        account: &Account,
        referrer: &str,
        downloads: &mut JoinSet<DownloadResult>,
        report: &mut AccountReport,
    ) -> Option<PageRequest> {
        let mut next = None;
        for action in actions {
            match action {
                WalkAction::FetchImage(url) => {
                    report.images_requested += 1;
                    self.spawn_download(downloads, account, url, referrer);
                }
                WalkAction::FetchNextPage(request) => next = Some(request),
            }
        }
        next
    }

    fn spawn_download(
        &self,
        downloads: &mut JoinSet<DownloadResult>,
        account: &Account,
        url: Url,
        referrer: &str,
    ) {
        let client = Arc::clone(&self.client);
        let storage = Arc::clone(&self.storage);
        let permits = Arc::clone(&self.download_permits);
        let account = account.clone();
        let request = self.request(url, RequestContext::default(), referrer);

        downloads.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return DownloadResult::Failed,
            };
            let url = request.url.clone();

            match client.get(request).await {
                Ok(response) => match accept_response(storage.as_ref(), &account, &response) {
                    Ok(outcome) => DownloadResult::Stored(outcome),
                    Err(e) => {
                        tracing::error!("[{}] failed to store {}: {}", account, url, e);
                        DownloadResult::Failed
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        "[{}] error: {} {} {}",
                        account,
                        e,
                        url,
                        e.body().unwrap_or_default()
                    );
                    DownloadResult::Failed
                }
            }
        });
    }

    fn request(&self, url: Url, context: RequestContext, referrer: &str) -> FetchRequest {
        let mut request = FetchRequest::new(url).with_context(context);
        prepare_request(&mut request, referrer);
        request
    }
}
