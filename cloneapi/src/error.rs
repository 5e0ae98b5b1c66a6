//! Error types for the voice-synthesis service client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for voice-synthesis service operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error returned by the service itself.
    #[error("synthesis service: {message} (http={http_status})")]
    Api { http_status: u16, message: String },

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(http_status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            http_status,
            message: message.into(),
        }
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::Api { http_status: 429, .. })
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { http_status, .. } if *http_status >= 500)
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => self.is_rate_limit() || self.is_server_error(),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(Error::api(429, "slow down").is_retryable());
        assert!(Error::api(503, "unavailable").is_retryable());
        assert!(!Error::api(400, "bad request").is_retryable());
        assert!(!Error::Config("no base url".to_string()).is_retryable());
    }
}
