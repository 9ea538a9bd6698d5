//! Client flow errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Anything that stops a login flow or probe.
///
/// There is no recovery path: callers surface these as hard failures.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no Set-Cookie header in response from {url}")]
    MissingCookie { url: String },

    #[error("no _csrf token found in page body from {url}")]
    MissingCsrfToken { url: String },

    #[error("redirect from {url} has no Location header")]
    MissingLocation { url: String },

    #[error("{url}: expected status {expected}, got {actual}")]
    UnexpectedStatus {
        url: String,
        expected: StatusCode,
        actual: StatusCode,
    },

    #[error("expected redirect to {expected}, got {actual}")]
    UnexpectedLocation { expected: String, actual: String },

    #[error("{url}: body does not contain {needle:?}")]
    BodyMismatch { url: String, needle: String },
}

/// Result type alias using FlowError.
pub type FlowResult<T> = Result<T, FlowError>;
