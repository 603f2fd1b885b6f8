//! Client for the same-origin visual-match endpoint served by `lens-server`.

use crate::provider::LensPayload;
use crate::synthetic;
use crate::SearchConfig;
use async_trait::async_trait;
use lens_commerce::ShoppingResult;
use lens_data::{FetchClient, FetchError, HttpTransport, Response, TimeoutConfig, Upstream};
use lens_observability::Diagnostics;
use std::sync::Arc;
use thiserror::Error;

/// Path of the visual-match endpoint below the API base.
pub const LENS_ENDPOINT: &str = "/google-lens";

/// Title used for demo visual matches.
const MOCK_MATCH_QUERY: &str = "Similar product";

/// Why a visual-match call produced nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageSearchFailure {
    #[error("no image was provided")]
    MissingImage,

    /// No HTTP answer at all.
    #[error("image endpoint unreachable: {0}")]
    Unreachable(String),

    /// The endpoint is not deployed where the client expects it.
    #[error("image endpoint not found (HTTP 404)")]
    EndpointNotFound,

    /// The endpoint answered but its upstream call failed.
    #[error("image provider failed (HTTP {status}): {message}")]
    UpstreamFailed { status: u16, message: String },

    /// The endpoint refused the request.
    #[error("image endpoint rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider answered with an `error` field.
    #[error("image provider error: {0}")]
    Provider(String),

    #[error("malformed image endpoint response: {0}")]
    Malformed(String),
}

impl ImageSearchFailure {
    /// Diagnostic stage. Reachability problems and upstream problems are kept apart.
    pub fn stage(&self) -> &'static str {
        match self {
            ImageSearchFailure::MissingImage => "image.missing",
            ImageSearchFailure::Unreachable(_) | ImageSearchFailure::EndpointNotFound => {
                "image.unreachable"
            }
            ImageSearchFailure::UpstreamFailed { .. } | ImageSearchFailure::Provider(_) => {
                "image.upstream"
            }
            ImageSearchFailure::Rejected { .. } => "image.rejected",
            ImageSearchFailure::Malformed(_) => "image.malformed",
        }
    }
}

/// Visual matches for one image, exact matches first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMatches {
    pub matches: Vec<ShoppingResult>,
    pub is_synthetic_data: bool,
    /// Set when the call failed; `matches` is then empty.
    pub failure: Option<ImageSearchFailure>,
}

impl ImageMatches {
    pub fn live(matches: Vec<ShoppingResult>) -> Self {
        Self {
            matches,
            is_synthetic_data: false,
            failure: None,
        }
    }

    pub fn synthetic(matches: Vec<ShoppingResult>) -> Self {
        Self {
            matches,
            is_synthetic_data: true,
            failure: None,
        }
    }

    pub fn failed(failure: ImageSearchFailure) -> Self {
        Self {
            matches: Vec::new(),
            is_synthetic_data: false,
            failure: Some(failure),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Something that can find visual matches for an image URL or data URI.
#[async_trait]
pub trait VisualRecognizer: Send + Sync {
    /// `mock` overrides the configured demo-data mode for this call.
    async fn recognize(&self, image_url: &str, mock: Option<bool>) -> ImageMatches;
}

/// Posts images to `{api_base}/google-lens`. Never returns an error: failures
/// come back as an empty match list with the reason attached and recorded.
#[derive(Debug, Clone)]
pub struct ImageSearchClient {
    fetch: FetchClient,
    mock_mode: bool,
    diagnostics: Diagnostics,
}

impl ImageSearchClient {
    pub fn new(config: &SearchConfig, diagnostics: Diagnostics) -> Self {
        let timeouts = TimeoutConfig::from_total(config.image_timeout());
        let fetch = FetchClient::reqwest_with_timeouts(Upstream::ImageEndpoint, timeouts);
        Self::from_fetch(fetch, config, diagnostics)
    }

    /// Use a custom transport, e.g. a stub in tests.
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        config: &SearchConfig,
        diagnostics: Diagnostics,
    ) -> Self {
        Self::from_fetch(
            FetchClient::new(transport, Upstream::ImageEndpoint),
            config,
            diagnostics,
        )
    }

    fn from_fetch(fetch: FetchClient, config: &SearchConfig, diagnostics: Diagnostics) -> Self {
        let fetch = fetch
            .with_base_url(config.api_base.clone())
            .with_timeouts(TimeoutConfig::from_total(config.image_timeout()))
            .with_default_header("Accept", "application/json");
        Self {
            fetch,
            mock_mode: config.mock_mode,
            diagnostics,
        }
    }

    /// Find visual matches for an image URL or `data:` URI.
    pub async fn search_by_image(&self, image_url: &str) -> ImageMatches {
        self.search_by_image_with(image_url, None).await
    }

    /// As [`search_by_image`](Self::search_by_image), with `mock` taking
    /// precedence over the configured mode when set.
    pub async fn search_by_image_with(&self, image_url: &str, mock: Option<bool>) -> ImageMatches {
        if mock.unwrap_or(self.mock_mode) {
            tracing::debug!("mock mode on, serving demo visual matches");
            return ImageMatches::synthetic(synthetic::lens_matches(MOCK_MATCH_QUERY));
        }

        match self.fetch_matches(image_url).await {
            Ok(matches) => {
                tracing::info!(count = matches.len(), "visual matches received");
                ImageMatches::live(matches)
            }
            Err(failure) => {
                self.diagnostics.record(failure.stage(), failure.to_string());
                ImageMatches::failed(failure)
            }
        }
    }

    async fn fetch_matches(&self, image_url: &str) -> Result<Vec<ShoppingResult>, ImageSearchFailure> {
        if image_url.trim().is_empty() {
            return Err(ImageSearchFailure::MissingImage);
        }

        let response = self
            .fetch
            .post(LENS_ENDPOINT)
            .json(&serde_json::json!({ "imageUrl": image_url }))
            .map_err(|e| ImageSearchFailure::Malformed(e.to_string()))?
            .send()
            .await
            .map_err(transport_failure)?;

        let payload = parse_payload(&response)?;
        if let Some(error) = payload.error.as_deref().filter(|e| !e.trim().is_empty()) {
            return Err(ImageSearchFailure::Provider(error.to_string()));
        }
        Ok(payload.results())
    }
}

fn transport_failure(error: FetchError) -> ImageSearchFailure {
    ImageSearchFailure::Unreachable(error.to_string())
}

fn parse_payload(response: &Response) -> Result<LensPayload, ImageSearchFailure> {
    match response.status {
        404 => return Err(ImageSearchFailure::EndpointNotFound),
        status if response.is_server_error() => {
            return Err(ImageSearchFailure::UpstreamFailed {
                status,
                message: response.error_message(),
            })
        }
        status if !response.is_success() => {
            return Err(ImageSearchFailure::Rejected {
                status,
                message: response.error_message(),
            })
        }
        _ => {}
    }

    response
        .json::<LensPayload>()
        .map_err(|e| ImageSearchFailure::Malformed(e.to_string()))
}

#[async_trait]
impl VisualRecognizer for ImageSearchClient {
    async fn recognize(&self, image_url: &str, mock: Option<bool>) -> ImageMatches {
        self.search_by_image_with(image_url, mock).await
    }
}
