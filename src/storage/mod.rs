//! Storage module for persisting downloaded artifacts
//!
//! This module handles:
//! - Deciding whether a fetched response is image media
//! - Writing each derived filename at most once per account directory
//! - Appending one audit log line per newly saved artifact

mod audit;
mod filesystem;
mod traits;

pub use audit::AuditLog;
pub use filesystem::{FsArtifactStorage, SAVED_MESSAGE};
pub use traits::{ArtifactStorage, StorageError, StorageResult};

use crate::crawler::FetchResponse;
use crate::state::Account;
use std::path::PathBuf;

/// An artifact written to persistent storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub account: Account,
    pub filename: String,
    pub path: PathBuf,
}

/// What happened to an inbound response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// A new file was written and logged
    Saved(DownloadedArtifact),

    /// A file with this name already exists; the response was discarded
    Duplicate { filename: String },

    /// The response is not image media and was ignored
    NotMedia { content_type: String },
}

impl StoreOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Returns true if a Content-Type value denotes image media
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("image")
}

/// Routes a fetched response into storage
///
/// Non-image responses are reported as `NotMedia` without touching storage.
/// Image responses are stored under the response's derived filename.
///
/// # Arguments
///
/// * `storage` - The storage backend
/// * `account` - The account the response was fetched for
/// * `response` - The completed fetch
pub fn accept_response(
    storage: &dyn ArtifactStorage,
    account: &Account,
    response: &FetchResponse,
) -> StorageResult<StoreOutcome> {
    if !is_image_content_type(&response.content_type) {
        return Ok(StoreOutcome::NotMedia {
            content_type: response.content_type.clone(),
        });
    }

    let filename = response.file_name();
    let outcome = storage.store(account, &filename, &response.body)?;
    if let StoreOutcome::Saved(artifact) = &outcome {
        tracing::debug!("[{}] saved {}", account, artifact.path.display());
    }
    Ok(outcome)
}
