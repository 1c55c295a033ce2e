//! # Harvest Configuration Module
//!
//! Which listing URLs to harvest and how hard to hit each site.
//!
//! Concurrency is bounded per host, not per source: two listing URLs on the
//! same site share one pool of in-flight detail requests.

/// Configuration for a harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Listing URLs, one per source
    pub sources: Vec<String>,

    /// Maximum detail extractions in flight per host
    pub concurrency_per_host: usize,

    /// Safety cap on listing pages followed per source
    pub max_pages: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            concurrency_per_host: 4,
            max_pages: 500,
        }
    }
}

/// Builder for HarvestConfig
#[derive(Debug, Default)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: HarvestConfig::default(),
        }
    }

    /// Add one listing URL; blank entries are ignored
    pub fn source(mut self, url: impl AsRef<str>) -> Self {
        let url = url.as_ref().trim();
        if !url.is_empty() {
            self.config.sources.push(url.to_string());
        }
        self
    }

    /// Add several listing URLs
    pub fn sources<S: AsRef<str>>(self, urls: impl IntoIterator<Item = S>) -> Self {
        urls.into_iter().fold(self, |builder, url| builder.source(url))
    }

    /// Set the per-host concurrency limit (at least 1)
    pub fn concurrency_per_host(mut self, limit: usize) -> Self {
        self.config.concurrency_per_host = limit.max(1);
        self
    }

    /// Set the listing page cap (at least 1)
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages.max(1);
        self
    }

    pub fn build(self) -> HarvestConfig {
        self.config
    }
}

impl HarvestConfig {
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::new()
    }
}
