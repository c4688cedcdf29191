// # Upstream Trait
//
// The transport seam between source adapters and the network.
//
// Adapters describe *what* to fetch with an [`Endpoint`]; the upstream
// implementation decides *how* (HTTP client, CORS relay proxy, error
// mapping). Tests substitute a fixture upstream that serves canned JSON.

use async_trait::async_trait;

/// Public CORS relay used by upstreams without permissive CORS headers
pub const DEFAULT_PROXY_BASE: &str = "https://api.codetabs.com/v1/proxy?quest=";

/// A GET request issued on behalf of a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Id of the source issuing the request, used in error messages
    pub source_id: String,
    /// Target URL
    pub url: String,
    /// Whether the request must go through the CORS relay proxy
    pub proxied: bool,
}

impl Endpoint {
    /// A direct request
    pub fn direct(source_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            url: url.into(),
            proxied: false,
        }
    }

    /// A request routed through the CORS relay proxy
    pub fn proxied(source_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            url: url.into(),
            proxied: true,
        }
    }

    /// The URL actually requested, given the proxy base
    pub fn request_url(&self, proxy_base: &str) -> String {
        if self.proxied {
            format!("{}{}", proxy_base, self.url)
        } else {
            self.url.clone()
        }
    }
}

/// Trait for upstream transports
///
/// One call is one GET. Implementations must not retry.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetch and decode a JSON body
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: the decoded body of a 2xx response
    /// - `Err(Error::Proxy)`: the relay proxy failed (e.g. rate limited)
    /// - `Err(Error::Upstream)`: network failure, non-2xx or undecodable body
    async fn get_json(&self, endpoint: &Endpoint) -> Result<serde_json::Value, crate::Error>;
}
