//! Key-Value store wrapper with automatic serialization.

use crate::{CacheError, KvStore, MemoryStore};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Type-safe cache over any [`KvStore`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Cloning is cheap and clones share the
/// same backend.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KvStore>,
}

impl Cache {
    /// Wrap a backend.
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// A cache over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let history: Option<Vec<HistoryEntry>> = cache.get("searchHistory")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get a value, falling back to `T::default()` when the key is absent.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, CacheError> {
        Ok(self.get(key)?.unwrap_or_default())
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes)
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.exists(key)
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.store.keys()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = cache_key!("wishlist", user_id);
/// // Returns "wishlist:user123"
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Prefs {
        index: usize,
        mock: bool,
    }

    #[test]
    fn test_typed_roundtrip() {
        let cache = Cache::in_memory();
        let prefs = Prefs { index: 2, mock: true };
        cache.set("prefs", &prefs).unwrap();

        let loaded: Option<Prefs> = cache.get("prefs").unwrap();
        assert_eq!(loaded, Some(prefs));
    }

    #[test]
    fn test_get_or_default_when_absent() {
        let cache = Cache::in_memory();
        let prefs: Prefs = cache.get_or_default("missing").unwrap();
        assert_eq!(prefs, Prefs::default());
    }

    #[test]
    fn test_get_reports_corrupt_value() {
        let cache = Cache::in_memory();
        cache.set("prefs", "not an object").unwrap();
        let result: Result<Option<Prefs>, _> = cache.get("prefs");
        assert!(matches!(result, Err(CacheError::SerializeError(_))));
    }

    #[test]
    fn test_clones_share_backend() {
        let cache = Cache::in_memory();
        let other = cache.clone();
        cache.set("k", &1u32).unwrap();
        assert!(other.exists("k").unwrap());
        other.delete("k").unwrap();
        assert!(cache.keys().unwrap().is_empty());
    }

    #[test]
    fn test_cache_key_macro() {
        assert_eq!(cache_key!("wishlist", "user123"), "wishlist:user123");
        assert_eq!(cache_key!("a", 1, "b"), "a:1:b");
    }
}
