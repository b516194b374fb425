//! In-memory store backend.

use crate::KeyValueStore;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory key/value store.
///
/// Used by tests and headless tooling in place of [`JsonFileStore`].
///
/// [`JsonFileStore`]: crate::JsonFileStore
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        let data = self.data.lock().expect("lock poisoned");
        data.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: String) {
        let mut data = self.data.lock().expect("lock poisoned");
        data.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        let mut data = self.data.lock().expect("lock poisoned");
        data.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();

        store.set_raw("test_key", "\"test_value\"".to_string());
        assert_eq!(store.get_raw("test_key"), Some("\"test_value\"".to_string()));

        assert!(store.has("test_key"));
        assert!(!store.has("nonexistent"));

        store.remove("test_key");
        assert_eq!(store.get_raw("test_key"), None);
    }

    #[test]
    fn test_overwrite_is_last_write_wins() {
        let store = MemoryStore::new();

        store.set_raw("k", "1".to_string());
        store.set_raw("k", "2".to_string());
        assert_eq!(store.get_raw("k"), Some("2".to_string()));
    }
}
