//! Offers returned by a search.

use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// One comparable offer.
///
/// Created by a search client and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingResult {
    /// 1-based rank as assigned by the source.
    pub position: u32,
    pub title: String,
    pub link: String,
    /// Store or marketplace name.
    pub source: String,
    /// Price as the source displays it (e.g. "$24.99").
    pub price: String,
    /// Numeric price, never negative. Zero when unknown.
    pub extracted_price: f64,
    pub thumbnail_url: String,
    pub delivery_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}

impl ShoppingResult {
    /// Whether the offer carries a usable price.
    pub fn has_price(&self) -> bool {
        self.extracted_price > 0.0
    }

    /// The numeric price as [`Money`].
    pub fn money(&self, currency: Currency) -> Money {
        Money::from_decimal(self.extracted_price, currency)
    }
}

/// The ordered results of one search, tagged with their provenance.
///
/// Provenance belongs to the whole set: a set is either entirely live
/// provider data or entirely synthetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    /// The query these results answer.
    pub query: String,
    pub results: Vec<ShoppingResult>,
    /// True when the provider call failed or mock mode was on.
    pub is_synthetic_data: bool,
    /// Why synthetic data was served, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl SearchResultSet {
    /// Results that came from the provider.
    pub fn live(query: impl Into<String>, results: Vec<ShoppingResult>) -> Self {
        Self {
            query: query.into(),
            results,
            is_synthetic_data: false,
            fallback_reason: None,
        }
    }

    /// Synthetic results served in place of provider data.
    pub fn synthetic(
        query: impl Into<String>,
        results: Vec<ShoppingResult>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            results,
            is_synthetic_data: true,
            fallback_reason: Some(reason.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Keep at most `limit` results. Source order and positions are untouched.
    pub fn truncate(mut self, limit: usize) -> Self {
        self.results.truncate(limit);
        self
    }

    /// Look up a result by its position.
    pub fn by_position(&self, position: u32) -> Option<&ShoppingResult> {
        self.results.iter().find(|r| r.position == position)
    }

    /// The cheapest priced offer.
    pub fn best_value(&self) -> Option<&ShoppingResult> {
        self.results
            .iter()
            .filter(|r| r.has_price())
            .min_by(|a, b| a.extracted_price.total_cmp(&b.extracted_price))
    }

    /// Results ordered by ascending price; unpriced offers last, ties by position.
    pub fn sorted_by_price(&self) -> Vec<&ShoppingResult> {
        let mut sorted: Vec<&ShoppingResult> = self.results.iter().collect();
        sorted.sort_by(|a, b| {
            b.has_price()
                .cmp(&a.has_price())
                .then(a.extracted_price.total_cmp(&b.extracted_price))
                .then(a.position.cmp(&b.position))
        });
        sorted
    }
}
