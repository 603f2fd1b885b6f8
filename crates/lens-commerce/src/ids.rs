//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing a HistoryId where a WishlistItemId is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident) => {
        /// A unique identifier.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a new unique ID.
            pub fn generate() -> Self {
                Self(generate_id())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(WishlistItemId);
define_id!(HistoryId);

impl WishlistItemId {
    /// Derive a stable ID from an offer link.
    ///
    /// The same link always yields the same ID, so toggling an offer from two
    /// different searches hits the same wishlist entry.
    pub fn from_link(link: &str) -> Self {
        let hash = link
            .trim()
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        Self(format!("offer-{:08x}", hash))
    }
}

/// Generate a unique ID using timestamp and an atomic counter.
fn generate_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);

    format!("{:x}-{:x}", timestamp, counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = HistoryId::new("hist-123");
        assert_eq!(id.as_str(), "hist-123");
    }

    #[test]
    fn test_id_generation() {
        let id1 = HistoryId::generate();
        let id2 = HistoryId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_from_string() {
        let id: WishlistItemId = "42".into();
        assert_eq!(id.as_str(), "42");
        assert_eq!(format!("{}", id), "42");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = WishlistItemId::new("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[test]
    fn test_link_ids_are_stable() {
        let a = WishlistItemId::from_link("https://example.com/product1");
        let b = WishlistItemId::from_link("https://example.com/product1");
        let c = WishlistItemId::from_link("https://example.com/product2");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_str().starts_with("offer-"));
    }
}
