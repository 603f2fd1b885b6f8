//! The user's library: wishlist and search history.
//!
//! [`Wishlist`] and [`SearchHistory`] are plain collections with the toggle
//! and eviction rules; [`LibraryStore`] owns one of each for the active
//! identity and persists every change.

mod history;
mod store;
mod wishlist;

pub use history::{HistoryEntry, SearchHistory, SearchType, MAX_HISTORY_ENTRIES};
pub use store::{LibraryStore, HISTORY_KEY, WISHLIST_KEY};
pub use wishlist::{Wishlist, WishlistEntry, WishlistItem, WishlistToggle};
