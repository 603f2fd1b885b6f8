//! Type-safe key-value persistence for PriceLens.
//!
//! Provides the browser-storage analogue the rest of the workspace persists
//! into: a [`KvStore`] backend (in-memory or one-file-per-key on disk) wrapped
//! by [`Cache`], which handles JSON serialization.
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_cache::{Cache, FileStore, StoreScope};
//!
//! let cache = Cache::new(FileStore::open("/tmp/pricelens")?);
//! let scope = StoreScope::identity("user-7");
//!
//! cache.set(&scope.key("wishlist"), &entries)?;
//! let entries: Option<Vec<Entry>> = cache.get(&scope.key("wishlist"))?;
//! ```

mod backend;
mod error;
mod kv;
mod scope;

pub use backend::{FileStore, KvStore, MemoryStore};
pub use error::CacheError;
pub use kv::Cache;
pub use scope::{IdentityId, StoreScope};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, FileStore, IdentityId, KvStore, MemoryStore, StoreScope};
}
