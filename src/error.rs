//! Error types for the event-harvester crate

use thiserror::Error;

/// Result type for harvester operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for harvester operations
#[derive(Debug, Error)]
pub enum Error {
    /// Network fetch failed after retries
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A detail page could not be turned into a record
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Harvest run error
    #[error("Harvest error: {0}")]
    Harvest(String),

    /// Record could not be written
    #[error("Sink error: {0}")]
    Sink(String),

    /// Chunking or embedding failure
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
