//! Error taxonomy for polling and user input

use thiserror::Error;

/// Failure while fetching from a remote quote source.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Network, timeout or overloaded-service failure. The next poll may succeed.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// The service answered, but with an error or a payload we cannot use.
    #[error("remote service error: {0}")]
    Permanent(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return FetchError::Permanent(format!("malformed payload: {err}"));
        }
        if let Some(status) = err.status() {
            return FetchError::from_status(status, &err.to_string());
        }
        // connect, timeout, body and request errors
        FetchError::Transient(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Permanent(format!("unexpected schema: {err}"))
    }
}

impl FetchError {
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            FetchError::Transient(format!("HTTP {status}: {context}"))
        } else {
            FetchError::Permanent(format!("HTTP {status}: {context}"))
        }
    }
}

/// Amount input that does not parse as a finite decimal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("not a number: {input:?}")]
pub struct ParseError {
    pub input: String,
}

/// Logo lookup for a symbol the metadata table does not (yet) know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown symbol: {0}")]
pub struct UnknownSymbol(pub String);
