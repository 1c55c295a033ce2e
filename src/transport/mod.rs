//! # Transport Module
//!
//! Fetches raw page bytes for the source adapters. This is the leaf of the
//! harvesting pipeline: every listing and detail page goes through a
//! [`Transport`].
//!
//! ## Key Components
//!
//! - `Transport`: the fetch capability (`url -> bytes`)
//! - `HttpTransport`: a single reqwest attempt with timeout and user agent
//! - `RetryingTransport`: decorator adding a politeness delay before each
//!   attempt and exponential backoff with full jitter between attempts
//! - `decode_body` / `fetch_text`: UTF-8 decoding with mojibake repair and
//!   whitespace normalization
//!
//! Only transient failures (timeouts, refused connections, DNS failures and
//! retryable HTTP statuses) are retried; anything else is returned at once.

mod config;
mod decode;
mod error;
mod http;
mod retry;

pub use config::{TransportConfig, TransportConfigBuilder};
pub use decode::{collapse_whitespace, decode_body, repair_mojibake};
pub use error::FetchError;
pub use http::HttpTransport;
pub use retry::{RetryPolicy, politeness_delay};

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Capability to fetch the raw bytes behind a URL
pub trait Transport: Send + Sync + 'static {
    /// Fetch `url` and return the response body
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Retry and politeness decorator around any [`Transport`]
#[derive(Debug)]
pub struct RetryingTransport<T: Transport> {
    inner: T,
    policy: RetryPolicy,
    min_delay: Duration,
    max_delay: Duration,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T, config: &TransportConfig) -> Self {
        Self {
            inner,
            policy: config.retry.clone(),
            min_delay: config.min_delay,
            max_delay: config.max_delay,
        }
    }

    /// The wrapped transport
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for RetryingTransport<T> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let pause = politeness_delay(self.min_delay, self.max_delay);
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            match self.inner.fetch(url).await {
                Ok(body) => {
                    if attempt > 1 {
                        debug!("Fetched {} on attempt {}", url, attempt);
                    }
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        "Fetching {} failed ({}), retrying in {} ms (attempt {}/{})",
                        url,
                        e,
                        delay.as_millis(),
                        attempt,
                        max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!("Giving up on {} after {} attempt(s): {}", url, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        (**self).fetch(url)
    }
}

/// Fetch `url` and decode the body into normalized text
pub async fn fetch_text<T: Transport>(transport: &T, url: &str) -> Result<String, FetchError> {
    let bytes = transport.fetch(url).await?;
    Ok(decode_body(&bytes))
}


#[cfg(test)]
mod tests {
    use super::stub::StubTransport;
    use super::*;

    fn config(attempts: u32) -> TransportConfig {
        TransportConfig::builder()
            .politeness_delay(Duration::ZERO, Duration::ZERO)
            .retry(RetryPolicy::immediate(attempts))
            .build()
    }

    const URL: &str = "https://example.com/event";

    #[tokio::test]
    async fn test_succeeds_after_four_transient_failures() {
        let stub = StubTransport::new()
            .respond(URL, Err(FetchError::Timeout))
            .respond(URL, Err(FetchError::ConnectionRefused))
            .respond(URL, Err(FetchError::HttpStatus(503)))
            .respond(URL, Err(FetchError::Dns("lookup failed".to_string())))
            .respond(URL, Ok(b"<h1>ok</h1>".to_vec()));

        let transport = RetryingTransport::new(stub, &config(5));
        let body = transport.fetch(URL).await.unwrap();

        assert_eq!(body, b"<h1>ok</h1>");
        assert_eq!(transport.inner().count(URL), 5);
    }

    #[tokio::test]
    async fn test_gives_up_after_exactly_five_attempts() {
        let stub = StubTransport::new().respond(URL, Err(FetchError::Timeout));

        let transport = RetryingTransport::new(stub, &config(5));
        let result = transport.fetch(URL).await;

        assert_eq!(result, Err(FetchError::Timeout));
        assert_eq!(transport.inner().count(URL), 5);
    }

    #[tokio::test]
    async fn test_terminal_error_is_not_retried() {
        let stub = StubTransport::new().respond(URL, Err(FetchError::HttpStatus(404)));

        let transport = RetryingTransport::new(stub, &config(5));
        let result = transport.fetch(URL).await;

        assert_eq!(result, Err(FetchError::HttpStatus(404)));
        assert_eq!(transport.inner().count(URL), 1);
    }

    #[tokio::test]
    async fn test_fetch_text_decodes() {
        let stub = StubTransport::new().page(URL, "<p>\n\n  hello\tworld </p>");
        assert_eq!(fetch_text(&stub, URL).await.unwrap(), "<p> hello world </p>");
    }
}
