//! The provider call behind `/api/google-lens`.

use std::sync::Arc;

use async_trait::async_trait;
use lens_data::{FetchClient, FetchError, HttpTransport, TimeoutConfig, Upstream};
use lens_search::LensPayload;
use thiserror::Error;

use crate::config::ServerConfig;

/// Why the provider call failed.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("No provider API key configured")]
    MissingApiKey,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// Finds visual matches for an image URL.
#[async_trait]
pub trait LensUpstream: Send + Sync {
    async fn lens(&self, image_url: &str) -> Result<LensPayload, UpstreamError>;
}

/// `GET {provider}/search.json?engine=google_lens&url=..`.
pub struct SerpLensUpstream {
    fetch: FetchClient,
    provider_url: String,
    api_key: String,
    gl: String,
    hl: String,
}

impl SerpLensUpstream {
    pub fn new(config: &ServerConfig) -> Self {
        let timeouts = TimeoutConfig::from_total(config.upstream_timeout());
        Self::from_fetch(FetchClient::reqwest_with_timeouts(Upstream::LensProvider, timeouts), config)
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, config: &ServerConfig) -> Self {
        Self::from_fetch(FetchClient::new(transport, Upstream::LensProvider), config)
    }

    fn from_fetch(fetch: FetchClient, config: &ServerConfig) -> Self {
        Self {
            fetch: fetch
                .with_timeouts(TimeoutConfig::from_total(config.upstream_timeout()))
                .with_default_header("Accept", "application/json"),
            provider_url: config.provider_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            gl: config.gl.clone(),
            hl: config.hl.clone(),
        }
    }
}

#[async_trait]
impl LensUpstream for SerpLensUpstream {
    async fn lens(&self, image_url: &str) -> Result<LensPayload, UpstreamError> {
        if self.api_key.trim().is_empty() {
            return Err(UpstreamError::MissingApiKey);
        }

        let response = self
            .fetch
            .get(format!("{}/search.json", self.provider_url))
            .query("engine", "google_lens")
            .query("url", image_url)
            .query("api_key", self.api_key.as_str())
            .query("gl", self.gl.as_str())
            .query("hl", self.hl.as_str())
            .send()
            .await?;

        if !response.is_success() {
            return Err(UpstreamError::Status {
                status: response.status,
                message: response.error_message(),
            });
        }

        let payload: LensPayload = response
            .json()
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        match payload.error.as_deref() {
            Some(error) if !error.trim().is_empty() => Err(UpstreamError::Provider(error.to_string())),
            _ => Ok(payload),
        }
    }
}
