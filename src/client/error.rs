//! Remote store error types
//!
//! Two families, split by direction: `FetchError` for reads (GET),
//! `RemoteWriteError` for writes (POST/DELETE). Both classify transport
//! failures the same way; callers catch them at the call site and surface a
//! transient message — no retries, no global handler.

use thiserror::Error;

/// Errors from read operations against the remote store
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Remote store unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Errors from write operations against the remote store
#[derive(Error, Debug)]
pub enum RemoteWriteError {
    #[error("Remote store unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub(crate) fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Unavailable
        } else {
            FetchError::Request(err)
        }
    }
}

impl RemoteWriteError {
    pub(crate) fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteWriteError::Timeout
        } else if err.is_connect() {
            RemoteWriteError::Unavailable
        } else {
            RemoteWriteError::Request(err)
        }
    }
}
