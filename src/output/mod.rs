//! Output module for crawl reports
//!
//! This module handles:
//! - Per-account crawl reports
//! - Aggregated run statistics printed at the end of a run

pub mod stats;

pub use stats::{print_statistics, AccountOutcome, AccountReport, RunStatistics};
