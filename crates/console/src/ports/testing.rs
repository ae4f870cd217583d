//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// Uniformly distributed 64-bit value.
    fn next_u64(&self) -> u64;
}
