//! Error types for the sink module

use crate::error::Error as CrateError;
use std::io;
use thiserror::Error;

/// Error type for persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    /// The record file or output directory could not be written
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The record could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SinkError> for CrateError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(e) => CrateError::Io(e),
            SinkError::Json(e) => CrateError::Json(e),
        }
    }
}
