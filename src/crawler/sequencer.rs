//! Account sequencer
//!
//! Accounts are crawled strictly one after another. After each account the
//! sequencer sleeps for a random pause drawn from the configured delay range.

use crate::config::RateLimitConfig;
use crate::crawler::coordinator::Coordinator;
use crate::output::{AccountOutcome, RunStatistics};
use crate::state::Account;
use std::time::Duration;

/// Half-open range `[min, max)` the inter-account pause is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Returns `None` unless `min < max`
    pub fn new(min: Duration, max: Duration) -> Option<Self> {
        (min < max).then_some(Self { min, max })
    }

    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        Self::new(config.min_delay(), config.max_delay())
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draws a uniformly distributed pause with millisecond resolution
    pub fn sample(&self) -> Duration {
        let low = saturating_millis(self.min);
        let high = saturating_millis(self.max);
        if low >= high {
            return self.min;
        }
        Duration::from_millis(fastrand::u64(low..high))
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Runs accounts in order with a pause after each one
pub struct Sequencer {
    coordinator: Coordinator,
    delay: Option<DelayRange>,
}

impl Sequencer {
    /// Creates a sequencer; `delay = None` disables the pause
    pub fn new(coordinator: Coordinator, delay: Option<DelayRange>) -> Self {
        Self { coordinator, delay }
    }

    /// Crawls every account and collects their reports
    ///
    /// A failing account is logged and recorded; the next account still runs.
    pub async fn run(&self, accounts: &[Account]) -> RunStatistics {
        let mut stats = RunStatistics::default();

        for (index, account) in accounts.iter().enumerate() {
            tracing::info!("[{}/{}] Crawling {}", index + 1, accounts.len(), account);

            let report = self.coordinator.crawl_account(account).await;
            match &report.outcome {
                AccountOutcome::Completed => {}
                AccountOutcome::Abandoned { reason } | AccountOutcome::Failed { reason } => {
                    tracing::warn!("[{}] moving on: {}", account, reason);
                }
            }
            stats.record(report);

            if let Some(delay) = self.delay {
                let pause = delay.sample();
                tracing::info!("Sleeping {:.1}s", pause.as_secs_f64());
                tokio::time::sleep(pause).await;
            }
        }

        stats
    }
}
