//! Error types shared by every component of the aggregator.
//!
//! Components never terminate the process themselves. They return
//! [`Result`] and the binary decides how a failure ends the run.

use reqwest::StatusCode;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or corrupt secret store, unusable settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// User denied access or the redirect was malformed
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// A free-text query produced no catalog match
    #[error("No results found for \"{query}\"")]
    Resolution { query: String },

    /// A run mode required pre-resolved input
    #[error("Found non-URI input: \"{0}\"")]
    NonCanonical(String),

    #[error("Rate limit still active for {url} after {attempts} attempts")]
    RateLimitExhausted { url: String, attempts: u32 },

    /// Server-side failure that may succeed when retried
    #[error("Temporary API failure {status} for {url}")]
    RetryableNetwork { status: StatusCode, url: String },

    /// Any other non-success status
    #[error("API request to {url} failed with {status}: {message}")]
    FatalApi {
        status: StatusCode,
        url: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An authenticated request was attempted before authorization
    #[error("No credentials available, authorization has not completed")]
    Unauthenticated,

    #[error("No eligible playback device found after {attempts} attempts")]
    DeviceUnavailable { attempts: u32 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Timed out: {0}")]
    Timeout(String),

    /// Post-run output check failed
    #[error("Verification failed: {0}")]
    Verification(String),
}

impl Error {
    /// Whether the failure is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RetryableNetwork { .. })
    }
}
