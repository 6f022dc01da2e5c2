//! Storage traits and error types
//!
//! This module defines the trait interface for artifact storage backends and
//! associated error types.

use crate::state::Account;
use crate::storage::StoreOutcome;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid artifact filename: {0:?}")]
    InvalidFilename(String),

    #[error("Audit log error: {0}")]
    AuditLog(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for artifact storage backends
///
/// The existence of a stored artifact is the only deduplication signal: a
/// backend must report [`StoreOutcome::Duplicate`] instead of overwriting.
pub trait ArtifactStorage: Send + Sync {
    /// Persists `bytes` as `filename` for `account` unless it already exists
    ///
    /// # Arguments
    ///
    /// * `account` - The account the artifact belongs to
    /// * `filename` - The derived filename (a single path component)
    /// * `bytes` - The artifact content
    ///
    /// # Returns
    ///
    /// `Saved` on a new write, `Duplicate` if the filename was already present
    fn store(&self, account: &Account, filename: &str, bytes: &[u8])
        -> StorageResult<StoreOutcome>;

    /// Returns true if an artifact with this filename exists for `account`
    fn contains(&self, account: &Account, filename: &str) -> bool;
}
