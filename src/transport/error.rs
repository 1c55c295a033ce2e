//! Error types for the transport module

use crate::error::Error as CrateError;
use std::error::Error as StdError;
use thiserror::Error;

/// Error type for fetch operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request timed out
    #[error("request timed out")]
    Timeout,

    /// The remote host refused the connection
    #[error("connection refused")]
    ConnectionRefused,

    /// Host name could not be resolved
    #[error("DNS failure: {0}")]
    Dns(String),

    /// Any other connection-level failure
    #[error("connection error: {0}")]
    Connect(String),

    /// The response body could not be read to the end
    #[error("body read error: {0}")]
    Body(String),

    /// The server answered with a non-success status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The request could not be built or sent
    #[error("request error: {0}")]
    Request(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout
            | FetchError::ConnectionRefused
            | FetchError::Dns(_)
            | FetchError::Connect(_)
            | FetchError::Body(_) => true,
            FetchError::HttpStatus(code) => {
                matches!(code, 408 | 425 | 429) || (500..600).contains(code)
            }
            FetchError::Request(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout;
        }
        if let Some(status) = err.status() {
            return FetchError::HttpStatus(status.as_u16());
        }

        let chain = error_chain(&err);
        if err.is_connect() {
            if refused(&err) {
                FetchError::ConnectionRefused
            } else if chain.contains("dns") || chain.contains("lookup address") {
                FetchError::Dns(chain)
            } else {
                FetchError::Connect(chain)
            }
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(chain)
        } else {
            FetchError::Request(chain)
        }
    }
}

/// Walk the source chain looking for an `io::ErrorKind::ConnectionRefused`
fn refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        current = e.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }
    parts.join(": ").to_lowercase()
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        CrateError::Fetch(err.to_string())
    }
}
