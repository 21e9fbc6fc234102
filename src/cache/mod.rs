//! Cache module for memoizing code-table responses in memory
//!
//! This module provides a content cache that keeps the most recent response body
//! for each URL together with an expiry time. It supports graceful degradation by
//! returning the stored body when a refetch fails, so lookups keep working while
//! the upstream service is unreachable.

mod clock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{Content, ContentCache};
