//! Store trait definitions.

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Trait for key/value storage backends.
///
/// The surface is deliberately infallible: a backend catches and logs its
/// own failures rather than propagating them, so callers always get a value
/// (or a fallback) back. Values are raw JSON text.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve the raw JSON text stored under a key.
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Store raw JSON text under a key.
    fn set_raw(&self, key: &str, value: String);

    /// Delete a key.
    fn remove(&self, key: &str);

    /// Check if a key exists.
    fn has(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }
}

/// Typed extension methods over any [`KeyValueStore`].
pub trait StoreExt: KeyValueStore {
    /// Retrieve and deserialize a value, returning `fallback` when the key
    /// is absent or the stored text does not parse.
    fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        match self.get_raw(key) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(key, error = %err, "Malformed stored value, using fallback");
                    fallback
                }
            },
            None => fallback,
        }
    }

    /// Serialize and store a value. Writes through synchronously before
    /// returning.
    fn set<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, raw),
            Err(err) => warn!(key, error = %err, "Failed to serialize value for storage"),
        }
    }

    /// Read-modify-write: load the current value (or `fallback`), apply `f`,
    /// and store the result.
    fn update<T, F>(&self, key: &str, fallback: T, f: F)
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(T) -> T,
    {
        let next = f(self.get(key, fallback));
        self.set(key, &next);
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn get_set_roundtrip() {
        let store = MemoryStore::new();

        store.set("count", &42i64);
        assert_eq!(store.get("count", 0i64), 42);
    }

    #[test]
    fn get_missing_returns_fallback() {
        let store = MemoryStore::new();

        assert_eq!(store.get("missing", 7i64), 7);
        assert_eq!(store.get::<Vec<String>>("missing", vec![]), Vec::<String>::new());
    }

    #[test]
    fn get_corrupted_returns_fallback() {
        let store = MemoryStore::new();
        store.set_raw("bad", "not json {{{".to_string());

        assert_eq!(store.get("bad", 9i64), 9);
    }

    #[test]
    fn update_applies_function_to_previous() {
        let store = MemoryStore::new();
        store.set("count", &10i64);

        store.update("count", 0i64, |n| n + 5);
        assert_eq!(store.get("count", 0i64), 15);
    }

    #[test]
    fn update_missing_starts_from_fallback() {
        let store = MemoryStore::new();

        store.update("count", 100i64, |n| n + 1);
        assert_eq!(store.get("count", 0i64), 101);
    }

    #[test]
    fn works_through_trait_object() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        store.set("flag", &true);
        assert!(store.get("flag", false));
        assert!(store.has("flag"));

        store.remove("flag");
        assert!(!store.has("flag"));
    }
}
