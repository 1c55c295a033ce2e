//! Error types for the harvest module

use crate::adapter::ExtractionError;
use crate::error::Error as CrateError;
use crate::sink::SinkError;
use crate::transport::FetchError;
use thiserror::Error;

/// Error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The run cannot start
    #[error("Configuration error: {0}")]
    Config(String),

    /// A page could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A page could not be parsed into links or a record
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// A record could not be persisted
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// A worker task failed
    #[error("Task error: {0}")]
    Task(String),
}

impl From<tokio::sync::AcquireError> for HarvestError {
    fn from(err: tokio::sync::AcquireError) -> Self {
        Self::Task(format!("Failed to acquire host permit: {}", err))
    }
}

impl From<HarvestError> for CrateError {
    fn from(err: HarvestError) -> Self {
        match err {
            HarvestError::Config(msg) => CrateError::Config(msg),
            HarvestError::Fetch(e) => e.into(),
            HarvestError::Extraction(e) => e.into(),
            HarvestError::Sink(e) => e.into(),
            HarvestError::Task(msg) => CrateError::Harvest(msg),
        }
    }
}
