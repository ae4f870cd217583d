//! Per-operation busy flags.
//!
//! A flag is counted: it stays set while at least one mutation holding the
//! key is in flight. Flags are held by a [`BusyGuard`], so the flag clears
//! on settlement whether the operation succeeded, failed, or its future was
//! dropped before completion.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use super::StoreState;

/// Identifies one in-flight operation, e.g. `assign-b1` or `toggle:e1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusyKey(String);

impl BusyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Qualified key `<operation>:<id>`.
    pub fn scoped(operation: &str, id: impl fmt::Display) -> Self {
        Self(format!("{operation}:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for a scoped key whose id part equals `id`.
    pub fn targets(&self, id: &str) -> bool {
        self.0
            .split_once(':')
            .is_some_and(|(_, scoped_id)| scoped_id == id)
    }
}

impl fmt::Display for BusyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusyKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyFlags(BTreeMap<BusyKey, usize>);

impl BusyFlags {
    pub fn is_set(&self, key: &BusyKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BusyKey> {
        self.0.keys()
    }

    /// Number of in-flight holders of `key`.
    pub fn holders(&self, key: &BusyKey) -> usize {
        self.0.get(key).copied().unwrap_or(0)
    }

    fn acquire(&mut self, key: &BusyKey) {
        *self.0.entry(key.clone()).or_insert(0) += 1;
    }

    fn release(&mut self, key: &BusyKey) {
        if let Some(count) = self.0.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.0.remove(key);
            }
        }
    }
}

/// Holds one count of a busy flag until dropped.
pub struct BusyGuard<S: StoreState> {
    state: Arc<watch::Sender<S>>,
    key: BusyKey,
}

impl<S: StoreState> BusyGuard<S> {
    pub fn acquire(state: &Arc<watch::Sender<S>>, key: BusyKey) -> Self {
        state.send_modify(|s| s.busy_mut().acquire(&key));
        Self {
            state: Arc::clone(state),
            key,
        }
    }

    pub fn key(&self) -> &BusyKey {
        &self.key
    }
}

impl<S: StoreState> Drop for BusyGuard<S> {
    fn drop(&mut self) {
        let key = &self.key;
        self.state.send_modify(|s| s.busy_mut().release(key));
    }
}
