//! Error types for the ingest module

use crate::error::Error as CrateError;
use crate::index::DbError;
use rig::embeddings::EmbeddingError;
use thiserror::Error;

/// Error type for chunking, embedding and indexing a record
#[derive(Debug, Error)]
pub enum IngestError {
    /// The embedding provider failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The vector index rejected the write
    #[error("Index error: {0}")]
    Index(#[from] DbError),

    /// The record's main information could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<IngestError> for CrateError {
    fn from(err: IngestError) -> Self {
        CrateError::Ingest(err.to_string())
    }
}
