//! API Error Types
//!
//! Splits every failed round trip into the two classes the client reacts to
//! differently: the request never completed (transport), or the server
//! answered with a non-success status (rejection).

use thiserror::Error;

/// API error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Setup(String),

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// The server answered with a non-success status
    #[error("API error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    /// A success response carried a body that could not be read
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when the server never answered (or answered unreadably).
    ///
    /// Rejections are business failures and are reported differently.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ApiError::Rejected { .. })
    }

    /// The server-supplied reason for a rejection, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
