//! Filesystem artifact storage
//!
//! Artifacts are written to `<image_root>/instagram_<account>/<filename>`.
//! Files are opened with create-new semantics, so an existing file is never
//! overwritten and two writers of the same name cannot both succeed.

use crate::state::Account;
use crate::storage::audit::AuditLog;
use crate::storage::traits::{ArtifactStorage, StorageError, StorageResult};
use crate::storage::{DownloadedArtifact, StoreOutcome};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

/// Message recorded in the audit log for every new artifact
pub const SAVED_MESSAGE: &str = "Save a new image.";

/// Artifact storage backed by a directory tree plus the audit log
#[derive(Debug)]
pub struct FsArtifactStorage {
    image_root: PathBuf,
    audit: AuditLog,
}

impl FsArtifactStorage {
    pub fn new(image_root: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_root: image_root.into(),
            audit: AuditLog::new(log_dir),
        }
    }

    /// Directory holding `account`'s artifacts
    pub fn account_dir(&self, account: &Account) -> PathBuf {
        self.image_root.join(account.output_dir_name())
    }
}

fn check_filename(filename: &str) -> StorageResult<()> {
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

impl ArtifactStorage for FsArtifactStorage {
    fn store(
        &self,
        account: &Account,
        filename: &str,
        bytes: &[u8],
    ) -> StorageResult<StoreOutcome> {
        check_filename(filename)?;

        let dir = self.account_dir(account);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(filename);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::trace!("[{}] {} already stored, skipping", account, filename);
                return Ok(StoreOutcome::Duplicate {
                    filename: filename.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = file.write_all(bytes).and_then(|_| file.flush()) {
            drop(file);
            // A half-written file would shadow every later download of this name.
            let _ = std::fs::remove_file(&path);
            return Err(e.into());
        }

        drop(file);

        // An unlogged file would be skipped as a duplicate on every later run.
        if let Err(e) = self.audit.append(account, SAVED_MESSAGE) {
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }

        Ok(StoreOutcome::Saved(DownloadedArtifact {
            account: account.clone(),
            filename: filename.to_string(),
            path,
        }))
    }

    fn contains(&self, account: &Account, filename: &str) -> bool {
        self.account_dir(account).join(filename).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(tmp: &TempDir) -> FsArtifactStorage {
        FsArtifactStorage::new(tmp.path().join("instagram"), tmp.path().join("log"))
    }

    fn log_lines(tmp: &TempDir) -> usize {
        let mut total = 0;
        for entry in std::fs::read_dir(tmp.path().join("log")).unwrap() {
            let content = std::fs::read_to_string(entry.unwrap().path()).unwrap();
            total += content.lines().count();
        }
        total
    }

    #[test]
    fn test_store_new_artifact() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let account = Account::new("alice");

        let outcome = storage.store(&account, "a.jpg", b"jpeg-bytes").unwrap();

        let expected = tmp.path().join("instagram/instagram_alice/a.jpg");
        match outcome {
            StoreOutcome::Saved(artifact) => {
                assert_eq!(artifact.path, expected);
                assert_eq!(artifact.filename, "a.jpg");
            }
            other => panic!("expected Saved, got {:?}", other),
        }
        assert_eq!(std::fs::read(expected).unwrap(), b"jpeg-bytes");
        assert!(storage.contains(&account, "a.jpg"));
    }

    #[test]
    fn test_store_twice_writes_once() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let account = Account::new("alice");

        let first = storage.store(&account, "a.jpg", b"first").unwrap();
        let second = storage.store(&account, "a.jpg", b"second").unwrap();

        assert!(matches!(first, StoreOutcome::Saved(_)));
        assert!(matches!(second, StoreOutcome::Duplicate { .. }));
        let path = storage.account_dir(&account).join("a.jpg");
        assert_eq!(std::fs::read(path).unwrap(), b"first");
        assert_eq!(log_lines(&tmp), 1);
    }

    #[test]
    fn test_same_filename_different_accounts() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        let a = storage.store(&Account::new("alice"), "a.jpg", b"1").unwrap();
        let b = storage.store(&Account::new("bob"), "a.jpg", b"2").unwrap();

        assert!(matches!(a, StoreOutcome::Saved(_)));
        assert!(matches!(b, StoreOutcome::Saved(_)));
        assert_eq!(log_lines(&tmp), 2);
    }

    #[test]
    fn test_audit_failure_removes_written_file() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the log directory should be makes every append fail.
        std::fs::write(tmp.path().join("log"), b"").unwrap();
        let storage = storage(&tmp);
        let account = Account::new("alice");

        let result = storage.store(&account, "a.jpg", b"jpeg-bytes");

        assert!(result.is_err());
        assert!(!storage.contains(&account, "a.jpg"));
    }

    #[test]
    fn test_rejects_path_traversal() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        for bad in ["", "..", "../escape.jpg", "dir/file.jpg"] {
            let result = storage.store(&Account::new("alice"), bad, b"x");
            assert!(
                matches!(result, Err(StorageError::InvalidFilename(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
