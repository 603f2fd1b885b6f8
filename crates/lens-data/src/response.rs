//! HTTP response handling.

use crate::FetchError;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// An HTTP response with a fully buffered body.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A JSON response, mostly for stub transports.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self::new(status, headers, value.to_string().into_bytes())
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response was a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Whether the body is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.body.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Parse the response body as JSON.
    ///
    /// An empty body is reported as a parse error rather than attempted.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        if self.is_blank() {
            return Err(FetchError::ParseError("empty response body".to_string()));
        }
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// Get a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Best-effort error message from the body.
    ///
    /// Prefers a JSON `message` or `error` field, falls back to the raw text
    /// (truncated), then to the status code.
    pub fn error_message(&self) -> String {
        if let Ok(value) = self.json::<serde_json::Value>() {
            for field in ["message", "error"] {
                if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                    return msg.to_string();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.body);
        if text.trim().is_empty() {
            format!("HTTP {}", self.status)
        } else {
            text.trim().chars().take(200).collect()
        }
    }
}
