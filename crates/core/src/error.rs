//! Error types for remote fetches.

/// Failures raised while fetching and mapping remote data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Server error (HTTP {status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The detail endpoint only accepts numeric ids.
    #[error("Invalid game id: {0}")]
    InvalidGameId(String),

    /// The request was superseded or its screen torn down.
    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether this error only signals cancellation and must not be shown.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Result alias used by the repository.
pub type FetchResult<T> = Result<T, FetchError>;
