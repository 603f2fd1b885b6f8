//! The seam between request building and the network.

use crate::{FetchError, Method, RequestBuilder, Response, TimeoutConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Executes a fully built request.
///
/// [`ReqwestTransport`] is the production implementation; tests plug in
/// stubs that return canned [`Response`]s.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(
        &self,
        request: RequestBuilder,
        timeouts: TimeoutConfig,
    ) -> Result<Response, FetchError>;
}

/// Transport backed by a shared `reqwest::Client`.
///
/// The connect timeout is fixed when the client is built; the total timeout
/// is applied per request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    connect_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self {
            client,
            connect_timeout,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(TimeoutConfig::default().connect)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: RequestBuilder,
        timeouts: TimeoutConfig,
    ) -> Result<Response, FetchError> {
        let url = request.full_url()?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url).timeout(timeouts.total);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| map_reqwest_error(e, timeouts))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, timeouts))?
            .to_vec();

        Ok(Response::new(status, headers, body))
    }
}

fn map_reqwest_error(e: reqwest::Error, timeouts: TimeoutConfig) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(timeouts.total)
    } else if e.is_connect() {
        FetchError::Connection(e.to_string())
    } else if e.is_builder() {
        FetchError::InvalidUrl(e.to_string())
    } else {
        FetchError::RequestError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_timeout_from_config() {
        let timeouts = TimeoutConfig::from_secs(40);
        let transport = ReqwestTransport::new(timeouts.connect);
        assert_eq!(transport.connect_timeout(), Duration::from_secs(10));
        assert_eq!(ReqwestTransport::default().connect_timeout(), Duration::from_millis(7500));
    }
}
