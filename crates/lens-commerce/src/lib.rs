//! Offer, wishlist and history domain types for PriceLens.
//!
//! - **Offers**: [`ShoppingResult`] and the provenance-tagged [`SearchResultSet`]
//! - **Insights**: price spread and best-value analysis over a result set
//! - **Library**: the wishlist and search history, persisted per identity
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_commerce::prelude::*;
//! use lens_cache::{Cache, StoreScope};
//!
//! let store = LibraryStore::open(Cache::in_memory(), StoreScope::Anonymous);
//!
//! let item = WishlistItem::from_result(&results.results[0]);
//! store.toggle_wishlist(item);
//! store.add_history("vintage camera", SearchType::Url);
//!
//! if let Some(insights) = PriceInsights::from_results(&results.results) {
//!     println!("Lowest: {}", insights.lowest.display());
//! }
//! ```

pub mod error;
pub mod ids;
pub mod insights;
pub mod library;
pub mod money;
pub mod offer;

pub use error::CommerceError;
pub use ids::*;
pub use insights::PriceInsights;
pub use library::{
    HistoryEntry, LibraryStore, SearchHistory, SearchType, Wishlist, WishlistEntry, WishlistItem,
    WishlistToggle,
};
pub use money::{Currency, Money};
pub use offer::{SearchResultSet, ShoppingResult};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::insights::PriceInsights;
    pub use crate::library::{
        HistoryEntry, LibraryStore, SearchHistory, SearchType, Wishlist, WishlistEntry,
        WishlistItem, WishlistToggle,
    };
    pub use crate::money::{Currency, Money};
    pub use crate::offer::{SearchResultSet, ShoppingResult};
}
