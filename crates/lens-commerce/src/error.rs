//! Commerce error types.

use lens_cache::CacheError;
use thiserror::Error;

/// Failures reading or writing a library collection.
///
/// The library recovers from both by logging them; they never reach callers
/// of [`LibraryStore`](crate::LibraryStore).
#[derive(Error, Debug)]
pub enum CommerceError {
    #[error("Failed to load {key}: {source}")]
    Load {
        key: String,
        #[source]
        source: CacheError,
    },

    #[error("Failed to persist {key}: {source}")]
    Persist {
        key: String,
        #[source]
        source: CacheError,
    },
}
