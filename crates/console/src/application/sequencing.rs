//! Settlement ordering for overlapping mutations of the same entity.
//!
//! Each mutation takes a [`Ticket`] from the store's [`Sequencer`] at
//! dispatch. On success the store asks [`Settlements::admit`] before
//! reconciling: a settlement older than the last one applied for the same
//! key is discarded, so the most recently issued request wins regardless of
//! the order in which responses arrive.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: String,
    seq: u64,
}

impl Ticket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Issues monotonically increasing tickets.
#[derive(Debug, Default)]
pub struct Sequencer {
    next: AtomicU64,
}

impl Sequencer {
    pub fn issue(&self, key: impl Into<String>) -> Ticket {
        Ticket {
            key: key.into(),
            seq: self.next.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }
}

/// Last applied ticket per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlements {
    applied: BTreeMap<String, u64>,
}

impl Settlements {
    /// Returns true and records `ticket` as applied unless a newer ticket
    /// for the same key was already applied.
    pub fn admit(&mut self, ticket: &Ticket) -> bool {
        match self.applied.get(&ticket.key) {
            Some(&applied) if applied > ticket.seq => false,
            _ => {
                self.applied.insert(ticket.key.clone(), ticket.seq);
                true
            }
        }
    }
}
