//! # Embedding Model Module
//!
//! Provides the embedding model used by the vector ingester, with built-in
//! rate limiting to stay inside the provider's quota.
//!
//! ## Key Components
//!
//! - `RateLimitedEmbeddingModel`: wraps any rig embedding model with a `governor` limiter
//! - `gemini_embedding_model`: Gemini `text-embedding-004`, rate limited
//! - `EmbeddingConversion`: conversion between rig embeddings and index blobs

use std::num::NonZeroU32;

use rig::providers::gemini;
use thiserror::Error;

use crate::error::Error as CrateError;

pub mod embedding;
#[cfg(test)]
pub(crate) mod mock;
mod ratelimited_embedding;

pub use embedding::EmbeddingConversion;
pub use ratelimited_embedding::RateLimitedEmbeddingModel;

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

const EMBEDDINGS_PER_MINUTE: NonZeroU32 = NonZeroU32::new(1000).unwrap();

/// The production embedding model
pub type GeminiEmbeddingModel = RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>;

/// Error type for model construction
#[derive(Debug, Error)]
pub enum ModelError {
    /// No usable API key was provided
    #[error("missing API key: {0}")]
    MissingApiKey(String),
}

impl From<ModelError> for CrateError {
    fn from(err: ModelError) -> Self {
        CrateError::Config(err.to_string())
    }
}

/// Rate-limited Gemini embedding model for the given API key
pub fn gemini_embedding_model(api_key: &str) -> Result<GeminiEmbeddingModel, ModelError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ModelError::MissingApiKey("API key is empty".to_string()));
    }

    let client = gemini::Client::new(api_key);
    Ok(RateLimitedEmbeddingModel::per_minute(
        client.embedding_model(gemini::embedding::EMBEDDING_004),
        EMBEDDINGS_PER_MINUTE,
    ))
}

/// Rate-limited Gemini embedding model using `GEMINI_API_KEY`
pub fn gemini_embedding_model_from_env() -> Result<GeminiEmbeddingModel, ModelError> {
    let api_key = std::env::var(GEMINI_API_KEY_VAR).map_err(|_| {
        ModelError::MissingApiKey(format!("{} environment variable must be set", GEMINI_API_KEY_VAR))
    })?;
    gemini_embedding_model(&api_key)
}
