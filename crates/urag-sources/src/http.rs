// # HTTP Upstream
//
// reqwest-backed implementation of the Upstream trait.
//
// ## Behavior
//
// - One GET per call, no retries and no transport timeout
// - Proxied endpoints are prefixed with the CORS relay base
// - Failures of the relay itself (connection, 429, `{"Error": ...}` body) are
//   `Error::Proxy`; statuses and bodies passed through from the upstream API
//   are `Error::Upstream`
//
// ## Status Mapping
//
// - 429: rate limited
// - 5xx: server error (transient)
// - other non-2xx: HTTP status

use async_trait::async_trait;
use serde_json::Value;
use urag_core::config::SourcesConfig;
use urag_core::traits::{Endpoint, Upstream};
use urag_core::{Error, Result};

/// User agent sent with every upstream request
const USER_AGENT: &str = concat!("urag/", env!("CARGO_PKG_VERSION"));

/// Upstream transport over HTTP
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    /// HTTP client for API requests
    client: reqwest::Client,

    /// CORS relay prefix for proxied endpoints
    proxy_base: String,
}

impl HttpUpstream {
    /// Create a new HTTP upstream
    ///
    /// # Parameters
    ///
    /// - `proxy_base`: CORS relay prefix; the target URL is appended verbatim
    pub fn new(proxy_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            proxy_base: proxy_base.into(),
        })
    }

    /// Create from the sources configuration
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.proxy_base.clone())
    }

    /// The CORS relay prefix
    pub fn proxy_base(&self) -> &str {
        &self.proxy_base
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value> {
        let url = endpoint.request_url(&self.proxy_base);
        tracing::debug!("GET {} (source={})", url, endpoint.source_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(endpoint, status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| decode_error(endpoint, format!("Failed to parse response: {}", e)))?;

        if endpoint.proxied
            && let Some(message) = body.get("Error").and_then(Value::as_str)
        {
            return Err(Error::proxy(&endpoint.source_id, message));
        }

        Ok(body)
    }
}

/// Attribute a failure to the relay or to the upstream API
pub(crate) fn transport_error(endpoint: &Endpoint, message: impl Into<String>) -> Error {
    if endpoint.proxied {
        Error::proxy(&endpoint.source_id, message)
    } else {
        Error::upstream(&endpoint.source_id, message)
    }
}

/// Map a non-2xx status to an error
///
/// Only a 429 on a proxied endpoint is the relay's; other statuses are
/// passed through from the upstream API.
pub(crate) fn status_error(endpoint: &Endpoint, status: u16) -> Error {
    match status {
        429 => transport_error(endpoint, format!("rate limited ({})", status)),
        500..=599 => Error::upstream(
            &endpoint.source_id,
            format!("server error (transient): HTTP {}", status),
        ),
        _ => Error::upstream(&endpoint.source_id, format!("HTTP {}", status)),
    }
}

/// An undecodable body is the upstream API's
pub(crate) fn decode_error(endpoint: &Endpoint, message: impl Into<String>) -> Error {
    Error::upstream(&endpoint.source_id, message)
}
