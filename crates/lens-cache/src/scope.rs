//! Identity scoping for persisted collections.

use serde::{Deserialize, Serialize};

/// A signed-in user's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityId(String);

impl IdentityId {
    /// Create a new identity ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identity ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which namespace persisted collections live in.
///
/// Anonymous data and each identity's data use disjoint keys, so switching
/// between them never merges collections.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreScope {
    #[default]
    Anonymous,
    Identity(IdentityId),
}

impl StoreScope {
    /// Scope for a signed-in identity.
    pub fn identity(id: impl Into<IdentityId>) -> Self {
        StoreScope::Identity(id.into())
    }

    /// Scope from an optional identity; blank IDs count as anonymous.
    pub fn from_option(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => StoreScope::identity(id),
            _ => StoreScope::Anonymous,
        }
    }

    /// Full key for `collection` in this scope.
    pub fn key(&self, collection: &str) -> String {
        match self {
            StoreScope::Anonymous => collection.to_string(),
            StoreScope::Identity(id) => crate::cache_key!(collection, id),
        }
    }

    /// The identity, if any.
    pub fn identity_id(&self) -> Option<&IdentityId> {
        match self {
            StoreScope::Anonymous => None,
            StoreScope::Identity(id) => Some(id),
        }
    }
}
