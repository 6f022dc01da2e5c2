//! State module for tracking crawl progress
//!
//! This module provides the per-account state owned by a single crawl session.
//!
//! # Components
//!
//! - `Account`: the profile handle being crawled
//! - `CrawlSession`: query identifier, subject id, cursor and signature seed for one account
//! - `WalkState`: the pagination state machine position (`Initial`, `Paging`, `Done`)

mod session;
mod walk_state;

// Re-export main types
pub use session::{Account, CrawlSession};
pub use walk_state::WalkState;
