//! Error types for urag
//!
//! Every failure in normal operation is scoped to a single slot's request.
//! The batch boundary in [`crate::ImageResolver`] catches slot errors and
//! reports them; nothing here is fatal to the process.

use thiserror::Error;

/// Result type alias for urag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for urag
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream API failure: network error, non-2xx status or undecodable body
    #[error("{source_id}: upstream error: {message}")]
    Upstream {
        /// Source that issued the request
        source_id: String,
        /// Error message
        message: String,
    },

    /// Failure reported by the CORS relay proxy rather than the upstream API
    #[error("{source_id}: proxy error: {message}")]
    Proxy {
        /// Source that issued the request
        source_id: String,
        /// Error message
        message: String,
    },

    /// The source cannot perform the requested operation (ID-less resolution)
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Caller contract violation (unknown species, malformed id, bad request)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Stored cache payload could not be decoded
    #[error("Cache corrupt: {0}")]
    CacheCorrupt(String),

    /// Key/value store or share channel I/O failure
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A batch is already in flight
    #[error("A fetch batch is already in flight")]
    Busy,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an upstream error
    pub fn upstream(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create a proxy error
    pub fn proxy(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Proxy {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a cache corruption error
    pub fn cache_corrupt(msg: impl Into<String>) -> Self {
        Self::CacheCorrupt(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error should be shown to the user for its slot
    ///
    /// Cache corruption is recovered locally and never surfaced.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::CacheCorrupt(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
