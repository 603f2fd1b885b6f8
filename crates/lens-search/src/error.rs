//! Search error types.
//!
//! Provider and proxy failures never appear here: they are recovered with
//! synthetic data. What remains are the errors a caller must act on.

use thiserror::Error;

/// Errors surfaced by the search pipeline.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The input cannot be searched at all (blank URL, empty image).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another search is still running on this orchestrator.
    #[error("A search is already in progress")]
    Busy,

    /// Not even synthetic results could be produced.
    #[error("No results could be produced for '{0}'")]
    NoResults(String),

    /// An image file could not be read.
    #[error("Failed to read image {path}: {message}")]
    ImageRead { path: String, message: String },

    /// Preference persistence failed.
    #[error("Cache error: {0}")]
    Cache(#[from] lens_cache::CacheError),
}
