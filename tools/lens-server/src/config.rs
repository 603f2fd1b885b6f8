//! Server configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Server configuration file (`lens-server.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Visual-match provider base URL.
    pub provider_url: String,

    /// Provider API key.
    pub api_key: String,

    /// Country code sent upstream.
    pub gl: String,

    /// Language code sent upstream.
    pub hl: String,

    /// Budget for one upstream call. Kept below the client's own timeout
    /// so the client sees our 500 rather than its own timeout.
    pub upstream_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            provider_url: "https://serpapi.com".to_string(),
            api_key: String::new(),
            gl: "us".to_string(),
            hl: "en".to_string(),
            upstream_timeout_secs: 35,
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Overlay `PORT`, `PRICELENS_API_KEY` and `PRICELENS_PROVIDER_URL`.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
        }
        if let Some(key) = get("PRICELENS_API_KEY") {
            self.api_key = key;
        }
        if let Some(url) = get("PRICELENS_PROVIDER_URL") {
            self.provider_url = url;
        }
        Ok(self)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(35));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lens-server.toml");
        std::fs::write(&path, "api_key = \"abc\"\nport = 9000\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.port, 9000);
        assert_eq!(config.gl, "us");
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = ServerConfig::load("/no/such/lens-server.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [("PORT", "3001"), ("PRICELENS_API_KEY", "env-key")]
            .into_iter()
            .collect();
        let config = ServerConfig::default()
            .apply_env_from(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.api_key, "env-key");

        let bad = ServerConfig::default().apply_env_from(|k| (k == "PORT").then(|| "http".to_string()));
        assert!(bad.is_err());
    }
}
