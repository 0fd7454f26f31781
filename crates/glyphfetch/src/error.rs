//! Error types for icon loading.

/// Result type alias for icon operations.
pub type Result<T> = std::result::Result<T, IconError>;

/// Errors that can occur while fetching or loading an icon.
///
/// The type is `Clone` because a single in-flight fetch is shared between
/// every concurrent requester of the same icon; a rejection has to reach all
/// of them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IconError {
    /// Transport-level failure (connection refused, DNS, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The status text or response diagnostic.
        message: String,
    },
}

impl IconError {
    /// Create a network error from any displayable cause.
    pub fn network(cause: impl std::fmt::Display) -> Self {
        Self::Network(cause.to_string())
    }

    /// Create an error for a non-success HTTP status.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for IconError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::HttpStatus {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}
