use super::{HistoryEntry, SearchHistory, SearchType, Wishlist, WishlistEntry, WishlistItem, WishlistToggle};
use crate::CommerceError;
use chrono::Utc;
use lens_cache::{Cache, StoreScope};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Collection name for the wishlist.
pub const WISHLIST_KEY: &str = "wishlist";
/// Collection name for the search history.
pub const HISTORY_KEY: &str = "searchHistory";

struct LibraryState {
    scope: StoreScope,
    wishlist: Wishlist,
    history: SearchHistory,
}

/// Wishlist and history for the active identity, persisted through a [`Cache`].
///
/// Every operation mutates memory and writes the affected collection while
/// holding one lock, so two operations never interleave their writes.
/// Storage failures are logged and otherwise ignored; the in-memory state is
/// authoritative for the life of the store.
///
/// # Example
///
/// ```rust,ignore
/// let store = LibraryStore::open(cache, StoreScope::Anonymous);
/// store.toggle_wishlist(WishlistItem::new("42", "Widget"));
/// assert!(store.is_in_wishlist("42"));
///
/// // Signing in switches to that identity's collections.
/// store.set_scope(StoreScope::identity("user-7"));
/// assert!(!store.is_in_wishlist("42"));
/// ```
pub struct LibraryStore {
    cache: Cache,
    state: Mutex<LibraryState>,
}

impl LibraryStore {
    /// Open the store and load the collections for `scope`.
    pub fn open(cache: Cache, scope: StoreScope) -> Self {
        let state = load_state(&cache, scope);
        Self {
            cache,
            state: Mutex::new(state),
        }
    }

    /// Switch identity. Collections are reloaded from the new scope; nothing
    /// is carried over from the old one.
    pub fn set_scope(&self, scope: StoreScope) {
        let mut state = self.lock();
        if state.scope == scope {
            return;
        }
        tracing::debug!(scope = ?scope, "switching library scope");
        *state = load_state(&self.cache, scope);
    }

    pub fn scope(&self) -> StoreScope {
        self.lock().scope.clone()
    }

    /// Add the item, or remove it if already saved.
    pub fn toggle_wishlist(&self, item: WishlistItem) -> WishlistToggle {
        let mut state = self.lock();
        let outcome = state.wishlist.toggle(item, Utc::now());
        self.persist(&state.scope, WISHLIST_KEY, &state.wishlist);
        outcome
    }

    /// Remove by ID. Returns whether an entry was removed.
    pub fn remove_from_wishlist(&self, id: &str) -> bool {
        let mut state = self.lock();
        let removed = state.wishlist.remove(id);
        if removed {
            self.persist(&state.scope, WISHLIST_KEY, &state.wishlist);
        }
        removed
    }

    pub fn is_in_wishlist(&self, id: &str) -> bool {
        self.lock().wishlist.contains(id)
    }

    /// Snapshot of the wishlist, newest first.
    pub fn wishlist(&self) -> Vec<WishlistEntry> {
        self.lock().wishlist.entries().to_vec()
    }

    pub fn clear_wishlist(&self) {
        let mut state = self.lock();
        state.wishlist.clear();
        self.persist(&state.scope, WISHLIST_KEY, &state.wishlist);
    }

    /// Record a completed search.
    pub fn add_history(&self, term: &str, search_type: SearchType) -> HistoryEntry {
        let mut state = self.lock();
        let entry = state.history.push(term, search_type, Utc::now());
        self.persist(&state.scope, HISTORY_KEY, &state.history);
        entry
    }

    /// Snapshot of the history, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().history.entries().to_vec()
    }

    pub fn clear_history(&self) {
        let mut state = self.lock();
        state.history.clear();
        self.persist(&state.scope, HISTORY_KEY, &state.history);
    }

    fn lock(&self) -> MutexGuard<'_, LibraryState> {
        // A panic mid-operation leaves whole collections behind, never a torn one.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist<T: Serialize>(&self, scope: &StoreScope, collection: &str, value: &T) {
        let key = scope.key(collection);
        if let Err(source) = self.cache.set(&key, value) {
            let e = CommerceError::Persist { key, source };
            tracing::warn!(error = %e, "library collection not saved");
        }
    }
}

fn load_state(cache: &Cache, scope: StoreScope) -> LibraryState {
    let wishlist: Wishlist = load_collection(cache, &scope.key(WISHLIST_KEY));
    let mut history: SearchHistory = load_collection(cache, &scope.key(HISTORY_KEY));
    history.enforce_cap();
    LibraryState {
        scope,
        wishlist,
        history,
    }
}

fn load_collection<T: DeserializeOwned + Default>(cache: &Cache, key: &str) -> T {
    match cache.get_or_default(key) {
        Ok(value) => value,
        Err(source) => {
            let e = CommerceError::Load {
                key: key.to_string(),
                source,
            };
            tracing::warn!(error = %e, "starting with an empty collection");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::MAX_HISTORY_ENTRIES;
    use lens_cache::{CacheError, KvStore, MemoryStore};

    struct FailingStore;

    impl KvStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::StoreError("disk on fire".to_string()))
        }

        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
            Err(CacheError::StoreError("disk on fire".to_string()))
        }

        fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::StoreError("disk on fire".to_string()))
        }

        fn keys(&self) -> Result<Vec<String>, CacheError> {
            Ok(vec![])
        }
    }

    fn anonymous_store() -> (LibraryStore, Cache) {
        let cache = Cache::in_memory();
        (LibraryStore::open(cache.clone(), StoreScope::Anonymous), cache)
    }

    // === Wishlist ===

    #[test]
    fn test_toggle_same_id_twice_empties_wishlist() {
        let (store, _) = anonymous_store();
        let widget = WishlistItem::new("42", "Widget");

        assert_eq!(store.toggle_wishlist(widget.clone()), WishlistToggle::Added);
        assert_eq!(store.wishlist().len(), 1);
        assert_eq!(store.toggle_wishlist(widget), WishlistToggle::Removed);
        assert_eq!(store.wishlist().len(), 0);
    }

    #[test]
    fn test_remove_and_contains() {
        let (store, _) = anonymous_store();
        store.toggle_wishlist(WishlistItem::new("1", "One"));
        assert!(store.is_in_wishlist("1"));
        assert!(store.remove_from_wishlist("1"));
        assert!(!store.is_in_wishlist("1"));
        assert!(!store.remove_from_wishlist("1"));
    }

    #[test]
    fn test_clear_wishlist_persists() {
        let (store, cache) = anonymous_store();
        store.toggle_wishlist(WishlistItem::new("1", "One"));
        store.clear_wishlist();

        let saved: Vec<serde_json::Value> = cache.get(WISHLIST_KEY).unwrap().unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn test_wishlist_survives_reopen() {
        let (store, cache) = anonymous_store();
        store.toggle_wishlist(WishlistItem::new("42", "Widget"));
        drop(store);

        let reopened = LibraryStore::open(cache, StoreScope::Anonymous);
        assert!(reopened.is_in_wishlist("42"));
    }

    // === History ===

    #[test]
    fn test_history_capped_and_persisted() {
        let (store, cache) = anonymous_store();
        for i in 0..25 {
            store.add_history(&format!("q{}", i), SearchType::Url);
        }

        let history = store.history();
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history[0].search_term, "q24");
        assert_eq!(history[19].search_term, "q5");

        let saved: Vec<serde_json::Value> = cache.get(HISTORY_KEY).unwrap().unwrap();
        assert_eq!(saved.len(), MAX_HISTORY_ENTRIES);
    }

    #[test]
    fn test_clear_history() {
        let (store, _) = anonymous_store();
        store.add_history("lamp", SearchType::Image);
        store.clear_history();
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_oversized_history_trimmed_on_load() {
        let cache = Cache::in_memory();
        let mut big = SearchHistory::new();
        for i in 0..MAX_HISTORY_ENTRIES {
            big.push(format!("q{}", i), SearchType::Url, Utc::now());
        }
        let mut raw = serde_json::to_value(&big).unwrap();
        let extra = raw[0].clone();
        raw.as_array_mut().unwrap().push(extra);
        cache.set(HISTORY_KEY, &raw).unwrap();

        let store = LibraryStore::open(cache, StoreScope::Anonymous);
        assert_eq!(store.history().len(), MAX_HISTORY_ENTRIES);
    }

    // === Identity scoping ===

    #[test]
    fn test_identity_scopes_do_not_merge() {
        let (store, cache) = anonymous_store();
        store.toggle_wishlist(WishlistItem::new("anon", "Anonymous pick"));
        store.add_history("anon search", SearchType::Url);

        store.set_scope(StoreScope::identity("user-7"));
        assert!(store.wishlist().is_empty());
        assert!(store.history().is_empty());

        store.toggle_wishlist(WishlistItem::new("mine", "Signed-in pick"));
        assert!(cache.exists("wishlist:user-7").unwrap());

        store.set_scope(StoreScope::Anonymous);
        assert!(store.is_in_wishlist("anon"));
        assert!(!store.is_in_wishlist("mine"));
    }

    #[test]
    fn test_scope_accessor() {
        let store = LibraryStore::open(Cache::in_memory(), StoreScope::identity("u1"));
        assert_eq!(store.scope(), StoreScope::identity("u1"));
    }

    // === Persistence failures ===

    #[test]
    fn test_storage_failures_are_swallowed() {
        let store = LibraryStore::open(Cache::new(FailingStore), StoreScope::Anonymous);

        assert_eq!(store.toggle_wishlist(WishlistItem::new("42", "Widget")), WishlistToggle::Added);
        assert!(store.is_in_wishlist("42"));
        store.add_history("lamp", SearchType::Url);
        assert_eq!(store.history().len(), 1);
        store.clear_history();
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_corrupt_collection_loads_empty() {
        let cache = Cache::new(MemoryStore::new());
        cache.set(WISHLIST_KEY, "garbage").unwrap();
        let store = LibraryStore::open(cache, StoreScope::Anonymous);
        assert!(store.wishlist().is_empty());
    }
}
