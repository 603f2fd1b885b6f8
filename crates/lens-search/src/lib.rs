//! Visual shopping search for PriceLens.
//!
//! - [`QueryExtractor`] turns a product URL or photo into a search query
//! - [`ImageSearchClient`] asks the visual-match endpoint what is in a photo
//! - [`ShoppingSearchClient`] fetches comparable offers, falling back to
//!   synthetic demo data whenever the provider cannot be used
//! - [`SearchOrchestrator`] runs one search at a time and records history
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_search::prelude::*;
//!
//! let config = SearchConfig::default().apply_env();
//! let orchestrator = SearchOrchestrator::from_config(config, library, Diagnostics::new());
//!
//! let outcome = orchestrator.submit(SearchInput::url(url)).await?;
//! if outcome.results.is_synthetic_data {
//!     println!("Showing demo results");
//! }
//! ```

pub mod config;
pub mod error;
pub mod image;
pub mod orchestrator;
pub mod provider;
pub mod query;
pub mod shopping;
pub mod synthetic;

pub use config::{Preferences, ProxyChoice, SearchConfig, SearchOptions, DEFAULT_PROXIES};
pub use error::SearchError;
pub use image::{ImageMatches, ImageSearchClient, ImageSearchFailure, VisualRecognizer};
pub use orchestrator::{
    NoopObserver, Notice, SearchObserver, SearchOrchestrator, SearchOutcome, SearchPhase,
};
pub use provider::{LensMatch, LensPayload, PriceField};
pub use query::{DerivedQuery, ImageFile, QueryExtractor, QuerySource, SearchInput};
pub use shopping::{ShoppingFailure, ShoppingSearchClient};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{Preferences, ProxyChoice, SearchConfig, SearchOptions};
    pub use crate::error::SearchError;
    pub use crate::image::{ImageMatches, ImageSearchClient, VisualRecognizer};
    pub use crate::orchestrator::{
        Notice, SearchObserver, SearchOrchestrator, SearchOutcome, SearchPhase,
    };
    pub use crate::query::{DerivedQuery, ImageFile, QueryExtractor, SearchInput};
    pub use crate::shopping::ShoppingSearchClient;
    pub use lens_observability::Diagnostics;
}
