//! Client configuration, persisted preferences and per-call options.

use crate::SearchError;
use lens_cache::Cache;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// CORS relays tried by default, in selection order.
pub const DEFAULT_PROXIES: [&str; 3] = [
    "https://corsproxy.io/?",
    "https://api.allorigins.win/raw?url=",
    "https://proxy.cors.sh/",
];

/// Cache key for the selected proxy index.
pub const PROXY_INDEX_KEY: &str = "selectedProxyIndex";
/// Cache key for the mock-data toggle.
pub const MOCK_TOGGLE_KEY: &str = "useMockData";

/// Everything the search clients need to know about the outside world.
///
/// Built once (file, then environment, then persisted preferences) and
/// handed to the clients at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Shopping/visual-match provider base URL.
    pub provider_url: String,
    pub api_key: String,
    /// Base of the same-origin API served by `lens-server`.
    pub api_base: String,
    /// Country code sent to the provider.
    pub gl: String,
    /// Language code sent to the provider.
    pub hl: String,
    pub proxies: Vec<String>,
    pub proxy_index: usize,
    pub proxy_enabled: bool,
    /// Sent as `x-cors-api-key` to relays that require one.
    pub proxy_api_key: Option<String>,
    pub mock_mode: bool,
    pub search_timeout_secs: u64,
    pub image_timeout_secs: u64,
    /// Upper bound on the whole image-recognition step.
    pub recognition_timeout_secs: u64,
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider_url: "https://serpapi.com".to_string(),
            api_key: String::new(),
            api_base: "http://localhost:8080/api".to_string(),
            gl: "us".to_string(),
            hl: "en".to_string(),
            proxies: DEFAULT_PROXIES.iter().map(|p| p.to_string()).collect(),
            proxy_index: 0,
            proxy_enabled: true,
            proxy_api_key: None,
            mock_mode: false,
            search_timeout_secs: 30,
            image_timeout_secs: 40,
            recognition_timeout_secs: 45,
            default_limit: 10,
        }
    }
}

impl SearchConfig {
    /// Overlay `PRICELENS_*` environment variables.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay variables from an arbitrary lookup.
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("PRICELENS_PROVIDER_URL") {
            self.provider_url = url;
        }
        if let Some(key) = get("PRICELENS_API_KEY") {
            self.api_key = key;
        }
        if let Some(base) = get("PRICELENS_API_BASE") {
            self.api_base = base;
        }
        if let Some(flag) = get("PRICELENS_USE_MOCK") {
            self.mock_mode = parse_flag(&flag);
        }
        if let Some(list) = get("PRICELENS_PROXIES") {
            self.proxies = list
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        self
    }

    /// Overlay persisted user preferences.
    pub fn apply_preferences(mut self, prefs: &Preferences) -> Self {
        if let Some(index) = prefs.selected_proxy_index {
            self.proxy_index = index;
        }
        if let Some(mock) = prefs.use_mock_data {
            self.mock_mode = mock;
        }
        self
    }

    /// The relay to use, or `None` when requests go direct.
    ///
    /// An out-of-range index selects the first relay.
    pub fn selected_proxy(&self) -> Option<&str> {
        if !self.proxy_enabled {
            return None;
        }
        self.proxies
            .get(self.proxy_index)
            .or_else(|| self.proxies.first())
            .map(String::as_str)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition_timeout_secs)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// User choices that survive restarts: proxy selection and mock toggle.
///
/// Each field is stored under its own key; unset fields leave the
/// configured value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub selected_proxy_index: Option<usize>,
    pub use_mock_data: Option<bool>,
}

impl Preferences {
    /// Load from the cache. Unreadable values are logged and treated as unset.
    pub fn load(cache: &Cache) -> Self {
        Self {
            selected_proxy_index: load_pref(cache, PROXY_INDEX_KEY),
            use_mock_data: load_pref(cache, MOCK_TOGGLE_KEY),
        }
    }

    /// Persist the fields that are set.
    pub fn save(&self, cache: &Cache) -> Result<(), SearchError> {
        if let Some(index) = self.selected_proxy_index {
            cache.set(PROXY_INDEX_KEY, &index)?;
        }
        if let Some(mock) = self.use_mock_data {
            cache.set(MOCK_TOGGLE_KEY, &mock)?;
        }
        Ok(())
    }
}

fn load_pref<T: serde::de::DeserializeOwned>(cache: &Cache, key: &str) -> Option<T> {
    match cache.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unreadable preference");
            None
        }
    }
}

/// How a single call should reach the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyChoice {
    /// Skip relays for this call.
    Direct,
    /// Use the configured relay at this index.
    Index(usize),
    /// Use this relay prefix.
    Url(String),
}

/// Per-call overrides for [`ShoppingSearchClient::search_with`](crate::ShoppingSearchClient::search_with).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Defaults to the configured limit.
    pub limit: Option<usize>,
    /// Force the book parameter set.
    pub is_book: bool,
    pub proxy: Option<ProxyChoice>,
    /// Overrides the configured mock mode.
    pub mock: Option<bool>,
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn book(mut self) -> Self {
        self.is_book = true;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyChoice) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_mock(mut self, mock: bool) -> Self {
        self.mock = Some(mock);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.search_timeout(), Duration::from_secs(30));
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.selected_proxy(), Some("https://corsproxy.io/?"));
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_selected_proxy_out_of_range_uses_first() {
        let config = SearchConfig {
            proxy_index: 9,
            ..SearchConfig::default()
        };
        assert_eq!(config.selected_proxy(), Some(DEFAULT_PROXIES[0]));
    }

    #[test]
    fn test_selected_proxy_disabled_or_empty() {
        let disabled = SearchConfig {
            proxy_enabled: false,
            ..SearchConfig::default()
        };
        assert_eq!(disabled.selected_proxy(), None);

        let empty = SearchConfig {
            proxies: vec![],
            ..SearchConfig::default()
        };
        assert_eq!(empty.selected_proxy(), None);
    }

    #[test]
    fn test_apply_env_from() {
        let vars: HashMap<&str, &str> = [
            ("PRICELENS_API_KEY", " secret "),
            ("PRICELENS_USE_MOCK", "true"),
            ("PRICELENS_PROXIES", "https://a.test/?, ,https://b.test/?"),
            ("PRICELENS_API_BASE", ""),
        ]
        .into_iter()
        .collect();

        let config = SearchConfig::default().apply_env_from(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key, "secret");
        assert!(config.mock_mode);
        assert_eq!(config.proxies, vec!["https://a.test/?", "https://b.test/?"]);
        assert_eq!(config.api_base, "http://localhost:8080/api");
    }

    #[test]
    fn test_config_deserializes_partial_toml_shape() {
        let config: SearchConfig =
            serde_json::from_str(r#"{ "api_key": "k", "mock_mode": true }"#).unwrap();
        assert_eq!(config.api_key, "k");
        assert!(config.mock_mode);
        assert_eq!(config.gl, "us");
    }

    #[test]
    fn test_preferences_roundtrip_through_cache() {
        let cache = Cache::in_memory();
        assert_eq!(Preferences::load(&cache), Preferences::default());

        let prefs = Preferences {
            selected_proxy_index: Some(2),
            use_mock_data: Some(true),
        };
        prefs.save(&cache).unwrap();
        assert_eq!(Preferences::load(&cache), prefs);
        assert!(cache.exists(PROXY_INDEX_KEY).unwrap());
    }

    #[test]
    fn test_apply_preferences_only_overrides_set_fields() {
        let config = SearchConfig {
            mock_mode: true,
            ..SearchConfig::default()
        }
        .apply_preferences(&Preferences {
            selected_proxy_index: Some(1),
            use_mock_data: None,
        });
        assert_eq!(config.proxy_index, 1);
        assert!(config.mock_mode);
    }

    #[test]
    fn test_unreadable_preference_is_unset() {
        let cache = Cache::in_memory();
        cache.set(PROXY_INDEX_KEY, "not a number").unwrap();
        assert_eq!(Preferences::load(&cache).selected_proxy_index, None);
    }

    #[test]
    fn test_search_options_builders() {
        let opts = SearchOptions::default()
            .with_limit(3)
            .book()
            .with_proxy(ProxyChoice::Direct)
            .with_mock(false);
        assert_eq!(opts.limit, Some(3));
        assert!(opts.is_book);
        assert_eq!(opts.proxy, Some(ProxyChoice::Direct));
        assert_eq!(opts.mock, Some(false));
    }
}
