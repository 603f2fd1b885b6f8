//! HTTP client utilities for PriceLens.
//!
//! A small request/response model on top of a pluggable [`HttpTransport`].
//! Every [`FetchClient`] is tagged with the [`Upstream`] it talks to, which
//! picks its timeout budget and names it in logs.
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_data::{FetchClient, Upstream};
//!
//! let client = FetchClient::reqwest(Upstream::ImageEndpoint)
//!     .with_base_url("http://localhost:8080/api");
//!
//! let response = client
//!     .post("/google-lens")
//!     .json(&serde_json::json!({ "imageUrl": image_url }))?
//!     .send()
//!     .await?;
//! ```

mod error;
mod request;
mod response;
mod timeout;
mod transport;
mod upstream;

pub use error::FetchError;
pub use request::{Method, RequestBuilder};
pub use response::Response;
pub use timeout::TimeoutConfig;
pub use transport::{HttpTransport, ReqwestTransport};
pub use upstream::Upstream;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// HTTP client for making outbound requests to one upstream.
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn HttpTransport>,
    upstream: Upstream,
    timeouts: TimeoutConfig,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
}

impl FetchClient {
    /// Create a client over the given transport.
    pub fn new(transport: Arc<dyn HttpTransport>, upstream: Upstream) -> Self {
        Self {
            transport,
            upstream,
            timeouts: upstream.timeouts(),
            base_url: None,
            default_headers: HashMap::new(),
        }
    }

    /// Create a client over a fresh [`ReqwestTransport`].
    pub fn reqwest(upstream: Upstream) -> Self {
        Self::reqwest_with_timeouts(upstream, upstream.timeouts())
    }

    /// Create a client over a fresh [`ReqwestTransport`] whose connect
    /// timeout comes from `timeouts`.
    pub fn reqwest_with_timeouts(upstream: Upstream, timeouts: TimeoutConfig) -> Self {
        Self::new(Arc::new(ReqwestTransport::new(timeouts.connect)), upstream).with_timeouts(timeouts)
    }

    /// Create a client with a base URL that will be prepended to relative paths.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the upstream's default timeouts.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn upstream(&self) -> Upstream {
        self.upstream
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        self.timeouts
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Post, url)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder {
        let url = url.into();
        let full_url = match &self.base_url {
            Some(base) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                format!("{}{}", base.trim_end_matches('/'), url)
            }
            _ => url,
        };

        let mut builder = RequestBuilder::new(method, full_url);
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }

        ClientRequestBuilder {
            client: self.clone(),
            builder,
        }
    }

    /// Send a prepared request, enforcing the total timeout.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response, FetchError> {
        let started = Instant::now();
        let method = request.method.as_str();
        let target = request.redacted_url();

        let outcome = tokio::time::timeout(
            self.timeouts.total,
            self.transport.execute(request, self.timeouts),
        )
        .await
        .unwrap_or(Err(FetchError::Timeout(self.timeouts.total)));

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(response) => tracing::debug!(
                upstream = %self.upstream,
                method,
                url = %target,
                status = response.status,
                elapsed_ms,
                "upstream call finished"
            ),
            Err(e) => tracing::debug!(
                upstream = %self.upstream,
                method,
                url = %target,
                error = %e,
                elapsed_ms,
                "upstream call failed"
            ),
        }
        outcome
    }
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("upstream", &self.upstream)
            .field("timeouts", &self.timeouts)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder {
    client: FetchClient,
    builder: RequestBuilder,
}

impl ClientRequestBuilder {
    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    /// Inspect the request without sending it.
    pub fn build(self) -> RequestBuilder {
        self.builder
    }

    /// Send the request and return the response.
    pub async fn send(self) -> Result<Response, FetchError> {
        self.client.execute(self.builder).await
    }
}
