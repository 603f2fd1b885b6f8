//! Provider wire formats and their normalization into [`ShoppingResult`].

use lens_commerce::ShoppingResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid price regex"));

/// A price as the provider sends it: a display string, or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Text(String),
    Amount(f64),
    Detailed {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        extracted_value: Option<f64>,
        #[serde(default)]
        currency: Option<String>,
    },
}

impl PriceField {
    pub fn display(&self) -> String {
        match self {
            PriceField::Text(text) => text.clone(),
            PriceField::Amount(amount) => format!("{:.2}", amount),
            PriceField::Detailed { value, .. } => value.clone().unwrap_or_default(),
        }
    }

    pub fn numeric(&self) -> Option<f64> {
        match self {
            PriceField::Text(text) => parse_price(text),
            PriceField::Amount(amount) => Some(*amount),
            PriceField::Detailed {
                value,
                extracted_value,
                ..
            } => extracted_value.or_else(|| value.as_deref().and_then(parse_price)),
        }
    }
}

/// Pull the first number out of a display price ("$1,299.00" → 1299.0).
pub fn parse_price(text: &str) -> Option<f64> {
    let number = PRICE_NUMBER.find(text)?.as_str().replace(',', "");
    number.parse().ok()
}

fn non_negative(price: Option<f64>) -> f64 {
    price.filter(|p| p.is_finite()).unwrap_or(0.0).max(0.0)
}

/// Body of a shopping-search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShoppingResponse {
    #[serde(default)]
    pub shopping_results: Vec<ProviderOffer>,
    /// Set by the provider on failures it still answers with 2xx.
    #[serde(default)]
    pub error: Option<String>,
}

/// One entry of `shopping_results`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderOffer {
    pub position: Option<u32>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub product_link: Option<String>,
    pub source: Option<String>,
    pub price: Option<PriceField>,
    pub extracted_price: Option<f64>,
    pub thumbnail: Option<String>,
    pub delivery: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
}

impl ProviderOffer {
    /// Normalize; `index` is the 0-based slot used when no position is given.
    pub fn into_result(self, index: usize) -> ShoppingResult {
        let display = self.price.as_ref().map(PriceField::display).unwrap_or_default();
        let extracted = self
            .extracted_price
            .or_else(|| self.price.as_ref().and_then(PriceField::numeric));

        ShoppingResult {
            position: self.position.filter(|p| *p >= 1).unwrap_or(index as u32 + 1),
            title: self.title.unwrap_or_default(),
            link: self.link.or(self.product_link).unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            price: display,
            extracted_price: non_negative(extracted),
            thumbnail_url: self.thumbnail.unwrap_or_default(),
            delivery_text: self.delivery.unwrap_or_default(),
            rating: self.rating,
            review_count: self.reviews,
        }
    }
}

/// A visual-match candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensMatch {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
}

impl LensMatch {
    pub fn to_result(&self, position: u32) -> ShoppingResult {
        let extracted = self
            .extracted_price
            .or_else(|| self.price.as_ref().and_then(PriceField::numeric));
        ShoppingResult {
            position,
            title: self.title.clone(),
            link: self.link.clone(),
            source: self.source.clone(),
            price: self.price.as_ref().map(PriceField::display).unwrap_or_default(),
            extracted_price: non_negative(extracted),
            thumbnail_url: self.thumbnail.clone(),
            delivery_text: String::new(),
            rating: self.rating,
            review_count: self.reviews,
        }
    }
}

/// The visual-match payload exchanged between provider, server and client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensPayload {
    #[serde(default)]
    pub search_metadata: serde_json::Value,
    #[serde(default)]
    pub search_parameters: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_matches: Option<Vec<LensMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_matches: Option<Vec<LensMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LensPayload {
    /// Exact matches first, then visual matches, numbered from 1.
    pub fn results(&self) -> Vec<ShoppingResult> {
        self.exact_matches
            .iter()
            .flatten()
            .chain(self.visual_matches.iter().flatten())
            .enumerate()
            .map(|(i, m)| m.to_result(i as u32 + 1))
            .collect()
    }

    pub fn match_count(&self) -> usize {
        self.exact_matches.as_ref().map_or(0, Vec::len)
            + self.visual_matches.as_ref().map_or(0, Vec::len)
    }
}
