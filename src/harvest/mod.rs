//! # Harvest Module
//!
//! Runs the whole pipeline for a set of listing URLs: discovery per source,
//! deduplication across the run, bounded concurrent extraction and handoff to
//! the record sink.
//!
//! ## Key Components
//!
//! - `HarvestConfig`: sources and limits for a run
//! - `Harvester`: the orchestrator
//! - `VisitedSet`: run-scoped deduplication of detail URLs
//! - `HarvestReport` / `SourceReport`: per-source counts and timing
//! - `HarvestProgress`: optional progress events for the CLI
//!
//! ## Concurrency
//!
//! Every source runs in its own task. Within a source each new detail URL
//! gets its own task, which first takes a permit from the semaphore of the
//! URL's host. Sources on the same host therefore share one pool. Failures
//! stay local: a failed detail page is counted, a failed discovery marks only
//! its own source, and a panicking task is reported as a failure.

mod config;
mod dedup;
mod error;
mod report;

pub use config::{HarvestConfig, HarvestConfigBuilder};
pub use dedup::VisitedSet;
pub use error::HarvestError;
pub use report::{HarvestReport, SourceReport};

use crate::adapter::{AdapterRegistry, ExtractionError, SourceAdapter, discover, extract};
use crate::ingest::Ingester;
use crate::error::Error as CrateError;
use crate::sink::{JsonFileSink, SaveOutcome, prepare_output_dir};
use crate::transport::Transport;
use chrono::Utc;
use futures::future;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// How a single detail URL ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Written,
    Skipped,
    Failed,
}

/// Progress events emitted while a run is in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestProgress {
    /// Discovery of `source` finished; `queued` of `count` URLs were new
    Discovered {
        source: String,
        count: usize,
        queued: usize,
    },

    /// One queued detail URL was handled
    Processed { url: String, outcome: ItemOutcome },
}

/// Harvest orchestrator
pub struct Harvester<T: Transport, I: Ingester> {
    config: Arc<HarvestConfig>,
    registry: Arc<AdapterRegistry>,
    transport: Arc<T>,
    sink: Arc<JsonFileSink<I>>,
    visited: Arc<VisitedSet>,
    host_limits: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
    progress: Option<mpsc::Sender<HarvestProgress>>,
}

impl<T: Transport, I: Ingester> Clone for Harvester<T, I> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: self.registry.clone(),
            transport: self.transport.clone(),
            sink: self.sink.clone(),
            visited: self.visited.clone(),
            host_limits: self.host_limits.clone(),
            progress: self.progress.clone(),
        }
    }
}

impl<T: Transport, I: Ingester> Harvester<T, I> {
    /// Create a harvester using every built-in adapter
    pub fn new(config: HarvestConfig, transport: T, sink: JsonFileSink<I>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(AdapterRegistry::default()),
            transport: Arc::new(transport),
            sink: Arc::new(sink),
            visited: Arc::new(VisitedSet::new()),
            host_limits: Arc::new(Mutex::new(HashMap::new())),
            progress: None,
        }
    }

    /// Replace the adapter registry
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Send progress events to `sender`
    pub fn with_progress(mut self, sender: mpsc::Sender<HarvestProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sink(&self) -> &JsonFileSink<I> {
        &self.sink
    }

    /// Harvest every configured source
    ///
    /// Only a run without any configured source is an error; everything else
    /// is reported per source.
    /// Replace the previous record set with a fresh harvest
    ///
    /// Nothing on disk or in the index is touched unless the configuration is
    /// usable. Then the output directory is emptied, the ingester reset and
    /// every source harvested.
    pub async fn run_fresh(&self) -> crate::Result<HarvestReport> {
        if self.config.sources.is_empty() {
            return Err(CrateError::Config("no sources configured".to_string()));
        }

        prepare_output_dir(self.sink.output_dir()).await?;
        self.sink.ingester().reset().await?;
        Ok(self.run().await?)
    }

    #[instrument(skip(self), fields(sources = self.config.sources.len()))]
    pub async fn run(&self) -> Result<HarvestReport, HarvestError> {
        if self.config.sources.is_empty() {
            return Err(HarvestError::Config("no sources configured".to_string()));
        }

        self.visited.clear().await;
        let mut report = HarvestReport::new(Utc::now());
        let timer = Instant::now();

        let mut listings = Vec::new();
        let mut tasks = Vec::new();
        for listing_url in &self.config.sources {
            let Some(adapter) = self.registry.for_url(listing_url) else {
                warn!("Skipping unrecognized source {}", listing_url);
                report.unrecognized.push(listing_url.clone());
                continue;
            };

            listings.push((listing_url.clone(), adapter.descriptor().kind));
            let harvester = self.clone();
            let listing_url = listing_url.clone();
            tasks.push(tokio::spawn(async move {
                harvester.harvest_source(adapter, listing_url).await
            }));
        }

        info!("Harvest started for {} sources", tasks.len());
        let results = future::join_all(tasks).await;

        for ((listing_url, kind), result) in listings.into_iter().zip(results) {
            match result {
                Ok(source_report) => report.sources.push(source_report),
                Err(e) => {
                    error!("Source task for {} failed: {}", listing_url, e);
                    let err = HarvestError::Task(e.to_string());
                    report.sources.push(SourceReport::failed(listing_url, kind, err));
                }
            }
        }

        report.elapsed = timer.elapsed();
        info!("Harvest complete: {}", report);
        Ok(report)
    }

    #[instrument(skip(self, adapter), fields(kind = %adapter.descriptor().kind))]
    async fn harvest_source(
        &self,
        adapter: Arc<dyn SourceAdapter>,
        listing_url: String,
    ) -> SourceReport {
        let mut report = SourceReport::new(listing_url.clone(), adapter.descriptor().kind);

        let links = match discover(
            adapter.as_ref(),
            self.transport.as_ref(),
            &listing_url,
            self.config.max_pages,
        )
        .await
        {
            Ok(links) => links,
            Err(e) => {
                error!("Discovery failed for {}: {}", listing_url, e);
                report.error = Some(e.to_string());
                return report;
            }
        };
        report.discovered = links.len();

        let mut urls = Vec::new();
        for url in links {
            if self.visited.check_and_mark(&url).await {
                urls.push(url);
            } else {
                debug!("Already visited {}", url);
                report.duplicates += 1;
            }
        }

        info!(
            "Found {} events on {} ({} new)",
            report.discovered,
            listing_url,
            urls.len()
        );
        // announced before any item task can report progress
        self.notify(HarvestProgress::Discovered {
            source: listing_url.clone(),
            count: report.discovered,
            queued: urls.len(),
        })
        .await;

        let mut tasks = Vec::with_capacity(urls.len());
        for url in &urls {
            let limit = self.host_limit(url).await;
            let harvester = self.clone();
            let adapter = adapter.clone();
            let task_url = url.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = limit.acquire_owned().await?;
                let result = harvester.process(adapter.as_ref(), &task_url).await;
                let outcome = match &result {
                    Ok(SaveOutcome::Saved { .. }) => ItemOutcome::Written,
                    Ok(SaveOutcome::Skipped) => ItemOutcome::Skipped,
                    Err(_) => ItemOutcome::Failed,
                };
                harvester
                    .notify(HarvestProgress::Processed {
                        url: task_url,
                        outcome,
                    })
                    .await;
                result
            }));
        }

        let results = future::join_all(tasks).await;
        for (url, result) in urls.into_iter().zip(results) {
            match result {
                Ok(Ok(SaveOutcome::Saved { .. })) => report.written += 1,
                Ok(Ok(SaveOutcome::Skipped)) => report.skipped += 1,
                Ok(Err(e)) => {
                    warn!("Failed to harvest {}: {}", url, e);
                    report.failures += 1;
                }
                Err(e) => {
                    error!("Task for {} failed: {}", url, e);
                    report.failures += 1;
                }
            }
        }

        report
    }

    /// Extract one detail page and hand the record to the sink
    async fn process(
        &self,
        adapter: &dyn SourceAdapter,
        url: &str,
    ) -> Result<SaveOutcome, HarvestError> {
        match extract(adapter, self.transport.as_ref(), url).await {
            Ok(record) => Ok(self.sink.save(&record).await?),
            Err(HarvestError::Extraction(ExtractionError::MissingTitle(_))) => {
                info!("No title found on {}, skipping", url);
                Ok(SaveOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    /// Semaphore shared by every request to the host of `url`
    async fn host_limit(&self, url: &str) -> Arc<Semaphore> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        self.host_limits
            .lock()
            .await
            .entry(host)
            .or_insert_with(|| Arc::new(Semaphore::new(self.config.concurrency_per_host.max(1))))
            .clone()
    }

    async fn notify(&self, event: HarvestProgress) {
        if let Some(sender) = &self.progress {
            // the receiver going away only means nobody is watching
            let _ = sender.send(event).await;
        }
    }
}
