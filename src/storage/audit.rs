//! Date-stamped audit log of saved artifacts
//!
//! One file per local calendar day (`<dir>/YYYY-MM-DD`), one line per event:
//! `YYYY-MM-DD HH:MM:SS [account]: message`.

use crate::state::Account;
use crate::storage::{StorageError, StorageResult};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Append-only text log shared by all downloads of a run
#[derive(Debug)]
pub struct AuditLog {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the log file for the day containing `at`
    pub fn file_for(&self, at: &DateTime<Local>) -> PathBuf {
        self.dir.join(at.format("%Y-%m-%d").to_string())
    }

    /// Appends one line stamped with the current local time
    pub fn append(&self, account: &Account, message: &str) -> StorageResult<PathBuf> {
        self.append_at(account, message, Local::now())
    }

    /// Appends one line stamped with `at`, creating the directory and file on demand
    pub fn append_at(
        &self,
        account: &Account,
        message: &str,
        at: DateTime<Local>,
    ) -> StorageResult<PathBuf> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::AuditLog("audit log lock poisoned".to_string()))?;

        std::fs::create_dir_all(&self.dir)?;
        let path = self.file_for(&at);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(
            file,
            "{} [{}]: {}",
            at.format("%Y-%m-%d %H:%M:%S"),
            account,
            message
        )?;

        Ok(path)
    }
}
