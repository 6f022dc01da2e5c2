//! Crawl reports and run statistics
//!
//! Each account crawl produces an [`AccountReport`]; the sequencer folds them
//! into [`RunStatistics`] for the end-of-run summary.

use crate::state::Account;
use std::fmt;
use std::time::Duration;

/// How an account's crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// The feed was walked until the upstream reported no more pages
    Completed,

    /// A page fetch failed; pages after it were not requested
    Abandoned { reason: String },

    /// The session could not continue (missing query id, malformed payload, ...)
    Failed { reason: String },
}

impl AccountOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for AccountOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Abandoned { reason } => write!(f, "abandoned ({})", reason),
            Self::Failed { reason } => write!(f, "failed ({})", reason),
        }
    }
}

/// Counters for one account's crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountReport {
    pub account: Account,

    /// Pages decoded and walked, the landing page included
    pub pages_walked: usize,

    /// Image fetches issued
    pub images_requested: usize,

    /// New artifacts written
    pub images_saved: usize,

    /// Fetched images whose filename already existed
    pub duplicates: usize,

    /// Video entries skipped without a request
    pub videos_skipped: usize,

    /// Image fetches or writes that failed
    pub download_failures: usize,

    pub outcome: AccountOutcome,
    pub elapsed: Duration,
}

impl AccountReport {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            pages_walked: 0,
            images_requested: 0,
            images_saved: 0,
            duplicates: 0,
            videos_skipped: 0,
            download_failures: 0,
            outcome: AccountOutcome::Completed,
            elapsed: Duration::ZERO,
        }
    }
}

/// Aggregated statistics for a whole run
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    pub reports: Vec<AccountReport>,
}

impl RunStatistics {
    pub fn record(&mut self, report: AccountReport) {
        self.reports.push(report);
    }

    pub fn accounts(&self) -> usize {
        self.reports.len()
    }

    pub fn completed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_completed())
            .count()
    }

    pub fn images_saved(&self) -> usize {
        self.reports.iter().map(|r| r.images_saved).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.reports.iter().map(|r| r.duplicates).sum()
    }

    pub fn download_failures(&self) -> usize {
        self.reports.iter().map(|r| r.download_failures).sum()
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Accounts crawled: {}", stats.accounts());
    println!("  Completed: {}", stats.completed());
    println!("  Images saved: {}", stats.images_saved());
    println!("  Duplicates skipped: {}", stats.duplicates());
    println!("  Download failures: {}", stats.download_failures());
    println!();

    println!("Accounts:");
    for report in &stats.reports {
        println!(
            "  {}: {} page(s), {} saved, {} duplicate(s), {} video(s) skipped, {:.1}s - {}",
            report.account,
            report.pages_walked,
            report.images_saved,
            report.duplicates,
            report.videos_skipped,
            report.elapsed.as_secs_f64(),
            report.outcome
        );
    }
}
