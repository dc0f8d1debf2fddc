use thiserror::Error;

/// Result type alias for management API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised while reading the stack/service directory.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("API request failed with status {status}: {url}")]
    Status { status: u16, url: String },

    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("API base URL cannot be a base: {0}")]
    NotABase(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
