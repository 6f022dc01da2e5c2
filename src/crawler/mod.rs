//! Crawler module for profile feed harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`FetchClient`] seam
//! - Query identifier discovery and request signing
//! - Payload decoding and the cursor walk
//! - Per-account coordination and account sequencing

mod coordinator;
mod decoder;
mod fetcher;
mod sequencer;
mod signature;
mod signer;
mod walker;

pub use coordinator::Coordinator;
pub use decoder::{decode_initial, decode_page, InitialPage, MediaRecord, PageInfo, PageResult};
pub use fetcher::{
    build_http_client, prepare_request, FetchClient, FetchError, FetchRequest, FetchResponse,
    HttpFetcher, RequestContext, REFERRER_HEADER, REQUESTED_WITH_HEADER,
};
pub use sequencer::{DelayRange, Sequencer};
pub use signature::{
    locate_script_asset, NthMatchExtractor, QueryIdExtractor, SignatureResolver,
    QUERY_ID_PATTERN,
};
pub use signer::{apply_signature, sign, SIGNATURE_HEADER};
pub use walker::{page_variables, CursorWalker, PageRequest, WalkAction};

use crate::config::Config;
use crate::output::RunStatistics;
use crate::state::Account;
use crate::Result;

/// Runs a complete harvest over `accounts`
///
/// Builds the HTTP client and filesystem storage from `config`, then crawls
/// the accounts in order. With `pause` disabled the inter-account delay is
/// skipped.
///
/// # Returns
///
/// * `Ok(RunStatistics)` - One report per account, failed ones included
/// * `Err(HarvestError)` - The client or storage could not be set up
pub async fn harvest(config: &Config, accounts: &[Account], pause: bool) -> Result<RunStatistics> {
    let coordinator = Coordinator::from_config(config)?;
    let delay = if pause {
        DelayRange::from_config(&config.rate_limit)
    } else {
        None
    };

    Ok(Sequencer::new(coordinator, delay).run(accounts).await)
}
