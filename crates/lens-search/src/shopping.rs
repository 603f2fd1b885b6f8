//! Shopping search against the provider, with synthetic fallback.
//!
//! [`ShoppingSearchClient::search`] always produces a [`SearchResultSet`].
//! Anything that stops live results (timeout, relay trouble, bad status,
//! provider error, unusable body) is recorded on the diagnostics channel
//! and answered with demo data tagged as synthetic.

use crate::config::{ProxyChoice, SearchConfig, SearchOptions};
use crate::provider::ShoppingResponse;
use crate::synthetic;
use chrono::Utc;
use lens_commerce::{SearchResultSet, ShoppingResult};
use lens_data::{FetchClient, FetchError, HttpTransport, Response, TimeoutConfig, Upstream};
use lens_observability::Diagnostics;
use std::sync::Arc;
use thiserror::Error;
use url::form_urlencoded;

/// Google Shopping category filter for books.
pub const BOOK_CATEGORY_FILTER: &str = "mr:1,cat:784";

/// Why live results were not used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShoppingFailure {
    #[error("Mock data enabled")]
    MockMode,

    #[error("No provider API key configured")]
    MissingApiKey,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Unreadable provider response: {0}")]
    Malformed(String),

    #[error("No shopping results found")]
    Empty,

    #[error("Could not build provider request: {0}")]
    InvalidRequest(String),
}

impl ShoppingFailure {
    pub fn stage(&self) -> &'static str {
        match self {
            ShoppingFailure::MockMode => "shopping.mock",
            ShoppingFailure::MissingApiKey => "shopping.config",
            ShoppingFailure::Timeout => "shopping.timeout",
            ShoppingFailure::Network(_) => "shopping.network",
            ShoppingFailure::Status { .. } => "shopping.status",
            ShoppingFailure::Provider(_) => "shopping.provider",
            ShoppingFailure::Malformed(_) => "shopping.malformed",
            ShoppingFailure::Empty => "shopping.empty",
            ShoppingFailure::InvalidRequest(_) => "shopping.request",
        }
    }
}

impl From<FetchError> for ShoppingFailure {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Timeout(_) => ShoppingFailure::Timeout,
            FetchError::InvalidUrl(msg) | FetchError::JsonError(msg) => {
                ShoppingFailure::InvalidRequest(msg)
            }
            other => ShoppingFailure::Network(other.to_string()),
        }
    }
}

/// Client for the provider's shopping search.
#[derive(Debug, Clone)]
pub struct ShoppingSearchClient {
    config: SearchConfig,
    fetch: FetchClient,
    diagnostics: Diagnostics,
}

impl ShoppingSearchClient {
    pub fn new(config: SearchConfig, diagnostics: Diagnostics) -> Self {
        let timeouts = TimeoutConfig::from_total(config.search_timeout());
        let fetch = FetchClient::reqwest_with_timeouts(Upstream::ShoppingSearch, timeouts);
        Self::from_fetch(fetch, config, diagnostics)
    }

    /// Use a custom transport, e.g. a stub in tests.
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        config: SearchConfig,
        diagnostics: Diagnostics,
    ) -> Self {
        Self::from_fetch(
            FetchClient::new(transport, Upstream::ShoppingSearch),
            config,
            diagnostics,
        )
    }

    /// Use a prepared [`FetchClient`] as is, keeping its timeouts.
    pub fn from_parts(fetch: FetchClient, config: SearchConfig, diagnostics: Diagnostics) -> Self {
        Self {
            config,
            fetch,
            diagnostics,
        }
    }

    fn from_fetch(fetch: FetchClient, config: SearchConfig, diagnostics: Diagnostics) -> Self {
        let fetch = fetch
            .with_timeouts(TimeoutConfig::from_total(config.search_timeout()))
            .with_default_header("Accept", "application/json");
        Self::from_parts(fetch, config, diagnostics)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search with the configured defaults and an explicit limit.
    pub async fn search(&self, query: &str, limit: usize) -> SearchResultSet {
        self.search_with(query, &SearchOptions::default().with_limit(limit))
            .await
    }

    /// Search with per-call overrides.
    pub async fn search_with(&self, query: &str, options: &SearchOptions) -> SearchResultSet {
        let limit = options.limit.unwrap_or(self.config.default_limit);
        let is_book = options.is_book || synthetic::is_book_query(query);
        let mock = options.mock.unwrap_or(self.config.mock_mode);

        let outcome = if mock {
            Err(ShoppingFailure::MockMode)
        } else {
            self.fetch_live(query, is_book, limit, options.proxy.as_ref()).await
        };

        match outcome {
            Ok(results) => {
                tracing::info!(query, count = results.len(), is_book, "shopping results received");
                SearchResultSet::live(query, results).truncate(limit)
            }
            Err(failure) => {
                if failure == ShoppingFailure::MockMode {
                    tracing::debug!(query, "mock mode on, serving demo shopping results");
                } else {
                    self.diagnostics.record(failure.stage(), failure.to_string());
                }
                let results = synthetic::shopping_results(query, is_book);
                SearchResultSet::synthetic(query, results, failure.to_string()).truncate(limit)
            }
        }
    }

    async fn fetch_live(
        &self,
        query: &str,
        is_book: bool,
        limit: usize,
        proxy: Option<&ProxyChoice>,
    ) -> Result<Vec<ShoppingResult>, ShoppingFailure> {
        if !self.config.has_api_key() {
            return Err(ShoppingFailure::MissingApiKey);
        }

        let target = self.target_url(query, is_book, limit)?;
        let relay = self.relay(proxy);
        let url = match relay {
            Some(prefix) => relayed_url(prefix, &target),
            None => target,
        };

        let mut request = self.fetch.get(url);
        if relay.is_some() {
            if let Some(key) = self.config.proxy_api_key.as_deref() {
                request = request.header("x-cors-api-key", key);
            }
        }
        tracing::debug!(query, relay = relay.unwrap_or("direct"), "searching provider");

        let response = request.send().await?;
        parse_results(&response)
    }

    /// `{provider}/search.json` with every search parameter encoded.
    pub fn target_url(&self, query: &str, is_book: bool, limit: usize) -> Result<String, ShoppingFailure> {
        let endpoint = format!("{}/search.json", self.config.provider_url.trim_end_matches('/'));
        let url = url::Url::parse_with_params(&endpoint, self.params(query, is_book, limit))
            .map_err(|e| ShoppingFailure::InvalidRequest(e.to_string()))?;
        Ok(url.into())
    }

    fn params(&self, query: &str, is_book: bool, limit: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", "google_shopping".to_string()),
            ("q", query.to_string()),
            ("gl", self.config.gl.clone()),
            ("hl", self.config.hl.clone()),
            ("num", limit.max(1).to_string()),
            ("api_key", self.config.api_key.clone()),
            ("_t", Utc::now().timestamp_millis().to_string()),
        ];
        if is_book {
            params.push(("tbs", BOOK_CATEGORY_FILTER.to_string()));
        }
        params
    }

    fn relay<'a>(&'a self, choice: Option<&'a ProxyChoice>) -> Option<&'a str> {
        match choice {
            None => self.config.selected_proxy(),
            Some(ProxyChoice::Direct) => None,
            Some(ProxyChoice::Index(index)) => self
                .config
                .proxies
                .get(*index)
                .or_else(|| self.config.proxies.first())
                .map(String::as_str),
            Some(ProxyChoice::Url(prefix)) => Some(prefix.as_str()),
        }
    }
}

/// `{prefix}{percent-encoded target}`.
pub fn relayed_url(prefix: &str, target: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("{}{}", prefix, encoded)
}

fn parse_results(response: &Response) -> Result<Vec<ShoppingResult>, ShoppingFailure> {
    if !response.is_success() {
        return Err(ShoppingFailure::Status {
            status: response.status,
            message: response.error_message(),
        });
    }

    let body: ShoppingResponse = response
        .json()
        .map_err(|e| ShoppingFailure::Malformed(e.to_string()))?;

    if let Some(error) = body.error.filter(|e| !e.trim().is_empty()) {
        return Err(ShoppingFailure::Provider(error));
    }
    if body.shopping_results.is_empty() {
        return Err(ShoppingFailure::Empty);
    }

    Ok(body
        .shopping_results
        .into_iter()
        .enumerate()
        .map(|(i, offer)| offer.into_result(i))
        .collect())
}
