//! JSON-file-backed store.

use crate::KeyValueStore;
use client_core::Paths;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key/value store persisted to a single JSON object file.
///
/// The whole map lives in memory; every mutation rewrites the file
/// synchronously (temp file then rename) before returning. Write failures
/// are logged, never surfaced, and the in-memory view stays authoritative
/// for the rest of the process lifetime.
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store at the given path, loading any existing contents.
    ///
    /// A missing file starts empty; a corrupt file is logged and also
    /// starts empty rather than failing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = Self::load(&path);
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    /// Open the store at the default location (`~/.skillexa/store.json`).
    pub fn open_default() -> Self {
        let paths = Paths::default();
        if let Err(err) = paths.ensure_dirs() {
            warn!(error = %err, "Failed to create store directory");
        }
        Self::open(paths.store_file())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No store file yet, starting empty");
                return BTreeMap::new();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read store file, starting empty");
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Corrupt store file, starting empty");
                BTreeMap::new()
            }
        }
    }

    /// Rewrite the backing file from the in-memory map. Failures are logged.
    fn flush(&self, data: &BTreeMap<String, String>) {
        let content = match serde_json::to_string_pretty(data) {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "Failed to serialize store contents");
                return;
            }
        };

        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(err) = std::fs::write(&tmp_path, content) {
            warn!(path = %tmp_path.display(), error = %err, "Failed to write store file");
            return;
        }
        if let Err(err) = std::fs::rename(&tmp_path, &self.path) {
            warn!(path = %self.path.display(), error = %err, "Failed to replace store file");
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        let data = self.data.lock().expect("lock poisoned");
        data.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: String) {
        let mut data = self.data.lock().expect("lock poisoned");
        data.insert(key.to_string(), value);
        self.flush(&data);
    }

    fn remove(&self, key: &str) {
        let mut data = self.data.lock().expect("lock poisoned");
        if data.remove(key).is_some() {
            self.flush(&data);
        }
    }
}
