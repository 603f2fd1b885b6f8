use crate::ids::HistoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of history entries retained.
pub const MAX_HISTORY_ENTRIES: usize = 20;

/// What kind of input a search started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Image,
    Url,
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchType::Image => write!(f, "image"),
            SearchType::Url => write!(f, "url"),
        }
    }
}

/// A completed search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub search_term: String,
    pub search_type: SearchType,
    pub timestamp: DateTime<Utc>,
}

/// Past searches, newest first, capped at [`MAX_HISTORY_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHistory {
    entries: Vec<HistoryEntry>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a search, evicting the oldest entries beyond the cap.
    pub fn push(
        &mut self,
        term: impl Into<String>,
        search_type: SearchType,
        now: DateTime<Utc>,
    ) -> HistoryEntry {
        let entry = HistoryEntry {
            id: HistoryId::generate(),
            search_term: term.into(),
            search_type,
            timestamp: now,
        };
        self.entries.insert(0, entry.clone());
        self.entries.truncate(MAX_HISTORY_ENTRIES);
        entry
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries loaded from storage may exceed the cap if it was edited by hand.
    pub(crate) fn enforce_cap(&mut self) {
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }
}
