use crate::ids::WishlistItemId;
use crate::offer::ShoppingResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An offer the user wants to save, before it is stamped with `added_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub name: String,
    pub store_name: String,
    pub price: f64,
    pub image_url: String,
    pub link: String,
}

impl WishlistItem {
    /// Minimal item, mostly useful when only the identity matters.
    pub fn new(id: impl Into<WishlistItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            store_name: String::new(),
            price: 0.0,
            image_url: String::new(),
            link: String::new(),
        }
    }

    /// Map a search result onto a wishlist item.
    ///
    /// The ID is derived from the offer link so it stays stable across
    /// searches; offers without a link fall back to their position.
    pub fn from_result(result: &ShoppingResult) -> Self {
        let id = if result.link.trim().is_empty() {
            WishlistItemId::new(result.position.to_string())
        } else {
            WishlistItemId::from_link(&result.link)
        };
        Self {
            id,
            name: result.title.clone(),
            store_name: result.source.clone(),
            price: result.extracted_price,
            image_url: result.thumbnail_url.clone(),
            link: result.link.clone(),
        }
    }
}

/// A saved offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub name: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub link: String,
    pub added_at: DateTime<Utc>,
}

impl WishlistEntry {
    fn from_item(item: WishlistItem, added_at: DateTime<Utc>) -> Self {
        Self {
            id: item.id,
            name: item.name,
            store_name: item.store_name,
            price: item.price,
            image_url: item.image_url,
            link: item.link,
            added_at,
        }
    }
}

/// Outcome of [`Wishlist::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishlistToggle {
    Added,
    Removed,
}

/// Saved offers, newest first, unique by ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the item, or remove it if an entry with the same ID exists.
    pub fn toggle(&mut self, item: WishlistItem, now: DateTime<Utc>) -> WishlistToggle {
        if self.remove(item.id.as_str()) {
            WishlistToggle::Removed
        } else {
            self.entries.insert(0, WishlistEntry::from_item(item, now));
            WishlistToggle::Added
        }
    }

    /// Remove by ID. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id.as_str() != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id.as_str() == id)
    }

    pub fn get(&self, id: &str) -> Option<&WishlistEntry> {
        self.entries.iter().find(|e| e.id.as_str() == id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of saved prices.
    pub fn total_price(&self) -> f64 {
        self.entries.iter().map(|e| e.price).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::tests::offer;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut wishlist = Wishlist::new();
        let item = WishlistItem::new("42", "Widget");

        assert_eq!(wishlist.toggle(item.clone(), Utc::now()), WishlistToggle::Added);
        assert_eq!(wishlist.len(), 1);
        assert!(wishlist.contains("42"));

        assert_eq!(wishlist.toggle(item, Utc::now()), WishlistToggle::Removed);
        assert_eq!(wishlist.len(), 0);
    }

    #[test]
    fn test_toggle_twice_restores_original() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle(WishlistItem::new("1", "Kept"), Utc::now());
        let original = wishlist.clone();

        let item = WishlistItem::new("2", "Transient");
        wishlist.toggle(item.clone(), Utc::now());
        wishlist.toggle(item, Utc::now());
        assert_eq!(wishlist, original);
    }

    #[test]
    fn test_new_entries_go_first() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle(WishlistItem::new("a", "A"), Utc::now());
        wishlist.toggle(WishlistItem::new("b", "B"), Utc::now());
        let ids: Vec<&str> = wishlist.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut wishlist = Wishlist::new();
        assert!(!wishlist.remove("nope"));
    }

    #[test]
    fn test_item_from_result() {
        let result = offer(3, "Desk Lamp", 19.99);
        let item = WishlistItem::from_result(&result);
        assert_eq!(item.name, "Desk Lamp");
        assert_eq!(item.store_name, "Example Store");
        assert_eq!(item.price, 19.99);
        assert_eq!(item.link, result.link);
        assert_eq!(item.id, WishlistItemId::from_link(&result.link));
    }

    #[test]
    fn test_item_from_result_without_link_uses_position() {
        let mut result = offer(7, "No Link", 5.0);
        result.link = String::new();
        assert_eq!(WishlistItem::from_result(&result).id.as_str(), "7");
    }

    #[test]
    fn test_persisted_shape_is_camel_case_array() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle(WishlistItem::new("42", "Widget"), Utc::now());
        let json = serde_json::to_value(&wishlist).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], "42");
        assert!(json[0].get("storeName").is_some());
        assert!(json[0].get("addedAt").is_some());
    }

    #[test]
    fn test_total_price() {
        let mut wishlist = Wishlist::new();
        wishlist.toggle(WishlistItem::from_result(&offer(1, "A", 10.0)), Utc::now());
        wishlist.toggle(WishlistItem::from_result(&offer(2, "B", 2.5)), Utc::now());
        assert!((wishlist.total_price() - 12.5).abs() < f64::EPSILON);
    }
}
