//! File-backed key-value storage.
//!
//! Stores key-value pairs in a JSON file, by default at:
//! - Linux: ~/.config/fixdesk/storage.json
//! - macOS: ~/Library/Application Support/io.fixdesk.console/storage.json
//! - Windows: C:\Users\<User>\AppData\Roaming\fixdesk\console\config\storage.json

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use directories::ProjectDirs;

use crate::ports::StorageProvider;

const FILE_NAME: &str = "storage.json";

#[derive(Clone)]
pub struct FileStorage {
    path: PathBuf,
    /// In-memory copy of the file contents
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl FileStorage {
    /// Platform config directory, or the working directory when the
    /// platform offers none.
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("io", "fixdesk", "console") {
            Some(dirs) => dirs.config_dir().join(FILE_NAME),
            None => PathBuf::from("fixdesk_storage.json"),
        }
    }

    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Open the storage file at `path`, loading whatever it already holds.
    ///
    /// A missing file starts empty; an unreadable or corrupt one is logged
    /// and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(data) => match serde_json::from_str::<HashMap<String, String>>(&data) {
                    Ok(map) => map,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "Failed to parse storage file: {}", e);
                        HashMap::new()
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to read storage file: {}", e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        tracing::debug!("File storage initialized at: {:?}", path);

        Self {
            path,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!("Failed to create storage directory: {}", e);
                return;
            }
        }

        let cache = match self.cache.read() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("Failed to acquire read lock for storage: {}", e);
                return;
            }
        };

        match serde_json::to_string_pretty(&*cache) {
            Ok(data) => {
                if let Err(e) = fs::write(&self.path, data) {
                    tracing::error!("Failed to write storage file: {}", e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize storage data: {}", e),
        }
    }
}

impl StorageProvider for FileStorage {
    fn save(&self, key: &str, value: &str) {
        match self.cache.write() {
            Ok(mut guard) => {
                guard.insert(key.to_string(), value.to_string());
            }
            Err(e) => {
                tracing::error!("Failed to acquire write lock for storage: {}", e);
                return;
            }
        }
        self.persist();
    }

    fn load(&self, key: &str) -> Option<String> {
        match self.cache.read() {
            Ok(guard) => guard.get(key).cloned(),
            Err(e) => {
                tracing::error!("Failed to acquire read lock for storage: {}", e);
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        let removed = match self.cache.write() {
            Ok(mut guard) => guard.remove(key).is_some(),
            Err(e) => {
                tracing::error!("Failed to acquire write lock for storage: {}", e);
                return;
            }
        };
        if removed {
            self.persist();
        }
    }
}
