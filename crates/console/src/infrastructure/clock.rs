//! Clock and random implementations.

use chrono::{DateTime, Utc};

use crate::ports::{ClockPort, RandomPort};

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses the thread-local generator.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn next_u64(&self) -> u64 {
        use rand::Rng;
        rand::thread_rng().gen()
    }
}

/// Fixed clock for testing.
#[cfg(any(test, feature = "testing"))]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(any(test, feature = "testing"))]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed random for testing.
#[cfg(any(test, feature = "testing"))]
pub struct FixedRandom(pub u64);

#[cfg(any(test, feature = "testing"))]
impl RandomPort for FixedRandom {
    fn next_u64(&self) -> u64 {
        self.0
    }
}
