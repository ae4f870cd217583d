//! Platform storage port.

/// Durable string key-value storage that survives process restarts.
///
/// Failures are logged by the implementation; callers treat storage as
/// best-effort.
pub trait StorageProvider: Send + Sync {
    /// Save a string value with the given key
    fn save(&self, key: &str, value: &str);

    /// Load a string value by key, returns None if not found
    fn load(&self, key: &str) -> Option<String>;

    /// Remove a value by key
    fn remove(&self, key: &str);
}
