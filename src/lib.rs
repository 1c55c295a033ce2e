//! # event-harvester - Event Listing Harvester for Rust
//!
//! This crate collects event announcements from a few public listing sites,
//! normalizes every event into an [`record::EventRecord`], writes one JSON file
//! per event and, optionally, chunks and embeds each record into a libSQL
//! vector index for later retrieval.
//!
//! ## Features
//!
//! - One adapter per listing site with its own pagination and selectors
//! - Polite HTTP transport with randomized delays and exponential backoff
//! - Run-scoped URL deduplication across sources
//! - Bounded per-host concurrency with isolated failures
//! - Recursive text chunking and rate-limited Gemini embeddings
//! - Freshness gate that skips runs younger than a threshold
//!
//! ## Example
//!
//! ```rust,no_run
//! use event_harvester::harvest::{HarvestConfig, Harvester};
//! use event_harvester::ingest::NullIngester;
//! use event_harvester::sink::JsonFileSink;
//! use event_harvester::transport::{HttpTransport, RetryingTransport, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport_config = TransportConfig::default();
//!     let transport = RetryingTransport::new(
//!         HttpTransport::new(&transport_config)?,
//!         &transport_config,
//!     );
//!
//!     let config = HarvestConfig::builder()
//!         .source("https://crossweb.pl/wydarzenia/")
//!         .build();
//!     let sink = JsonFileSink::new("scraped_events", NullIngester);
//!
//!     let report = Harvester::new(config, transport, sink).run().await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

mod error;

pub mod adapter;
pub mod freshness;
pub mod harvest;
pub mod index;
pub mod ingest;
pub mod model;
pub mod record;
pub mod sink;
pub mod transport;

pub use error::{Error, Result};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::adapter::{AdapterRegistry, SourceAdapter, SourceKind};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::harvest::{HarvestConfig, HarvestReport, Harvester};
    pub use crate::record::EventRecord;
    pub use crate::transport::Transport;
}
