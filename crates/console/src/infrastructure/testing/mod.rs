//! In-memory doubles and fixtures for store tests.

pub mod fixtures;
mod gated;

pub use gated::GatedGateway;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::ports::StorageProvider;

/// StorageProvider that lives only as long as the value.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl StorageProvider for MemoryStorage {
    fn save(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn load(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
