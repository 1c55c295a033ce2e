//! # Transport Configuration Module
//!
//! Controls how listing and detail pages are fetched: request timeout, the
//! `User-Agent` presented to the source sites, the randomized politeness delay
//! applied before every attempt, and the retry policy for transient failures.
//!
//! The defaults are tuned for public event sites that throttle aggressive
//! clients: a browser-like user agent, a 1–3 second politeness delay and up to
//! five attempts with jittered exponential backoff.

use super::retry::RetryPolicy;
use std::time::Duration;

/// Configuration for the transport layer
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for a single request
    pub timeout: Duration,

    /// User agent to use for requests
    pub user_agent: String,

    /// Lower bound of the random delay before each attempt
    pub min_delay: Duration,

    /// Upper bound of the random delay before each attempt
    pub max_delay: Duration,

    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}

/// Builder for TransportConfig
#[derive(Debug, Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: TransportConfig::default(),
        }
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the politeness delay range
    pub fn politeness_delay(mut self, min: Duration, max: Duration) -> Self {
        self.config.min_delay = min;
        self.config.max_delay = max;
        self
    }

    /// Set the maximum number of attempts per request
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the full retry policy
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TransportConfig {
        self.config
    }
}

impl TransportConfig {
    /// Create a new builder
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::new()
    }
}
