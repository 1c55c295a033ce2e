//! # Ingest Module
//!
//! Makes saved records searchable. The record sink hands every saved record to
//! an [`Ingester`] together with the location of its JSON file.
//!
//! ## Key Components
//!
//! - `Ingester`: the handoff contract used by the sink
//! - `VectorIngester`: chunks, embeds and stores records in the libSQL index
//! - `NullIngester`: accepts and discards records when indexing is disabled
//! - `chunk_text`: recursive character splitter for descriptions
//!
//! Every record yields its description windows followed by one final chunk
//! holding the serialized title, fields and source.

mod chunking;
mod error;

pub use chunking::{ChunkOptions, chunk_text};
pub use error::IngestError;

use crate::index::{ChunkKind, Database, NewChunk};
use crate::record::{MainInformation, NOT_AVAILABLE};
use rig::embeddings::{EmbeddingError, EmbeddingModel};
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Receives every record written by the sink
pub trait Ingester: Send + Sync + 'static {
    /// Index one record; returns the number of chunks stored
    fn ingest(
        &self,
        main_information: &MainInformation<'_>,
        description: &str,
        location: &str,
    ) -> impl Future<Output = Result<usize, IngestError>> + Send;

    /// Drop everything indexed by earlier runs
    fn reset(&self) -> impl Future<Output = Result<(), IngestError>> + Send;
}

/// Ingester that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIngester;

impl Ingester for NullIngester {
    async fn ingest(
        &self,
        _main_information: &MainInformation<'_>,
        _description: &str,
        _location: &str,
    ) -> Result<usize, IngestError> {
        Ok(0)
    }

    async fn reset(&self) -> Result<(), IngestError> {
        Ok(())
    }
}

/// Text pieces of one record, in storage order
pub fn prepare_chunks(
    main_information: &MainInformation<'_>,
    description: &str,
    options: &ChunkOptions,
) -> Result<Vec<(ChunkKind, String)>, IngestError> {
    let mut chunks: Vec<(ChunkKind, String)> = Vec::new();

    let description = description.trim();
    if !description.is_empty() && description != NOT_AVAILABLE {
        chunks.extend(
            chunk_text(description, options)
                .into_iter()
                .map(|text| (ChunkKind::Description, text)),
        );
    }

    chunks.push((ChunkKind::Fields, serde_json::to_string(main_information)?));
    Ok(chunks)
}

/// Chunks, embeds and stores records in the vector index
pub struct VectorIngester<E: EmbeddingModel> {
    model: E,
    database: Database,
    options: ChunkOptions,
    write_lock: Mutex<()>,
}

impl<E: EmbeddingModel> VectorIngester<E> {
    pub fn new(model: E, database: Database) -> Self {
        Self {
            model,
            database,
            options: ChunkOptions::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_chunk_options(mut self, options: ChunkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl<E: EmbeddingModel + 'static> Ingester for VectorIngester<E> {
    #[instrument(skip(self, main_information, description), fields(title = main_information.title))]
    async fn ingest(
        &self,
        main_information: &MainInformation<'_>,
        description: &str,
        location: &str,
    ) -> Result<usize, IngestError> {
        let pieces = prepare_chunks(main_information, description, &self.options)?;

        let batch_size = E::MAX_DOCUMENTS.max(1);
        let mut embeddings = Vec::with_capacity(pieces.len());
        for batch in pieces.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            let batch_embeddings = self.model.embed_texts(texts).await?;
            if batch_embeddings.len() != batch.len() {
                return Err(IngestError::Embedding(EmbeddingError::ResponseError(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    batch_embeddings.len()
                ))));
            }
            embeddings.extend(batch_embeddings);
        }

        let chunks: Vec<NewChunk> = pieces
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, ((kind, text), embedding))| NewChunk {
                kind,
                position,
                text,
                embedding,
            })
            .collect();

        let _guard = self.write_lock.lock().await;
        self.database
            .store_record(
                location,
                main_information.title,
                main_information.source,
                &chunks,
            )
            .await?;

        debug!("Indexed {} chunks for {}", chunks.len(), location);
        Ok(chunks.len())
    }

    async fn reset(&self) -> Result<(), IngestError> {
        let _guard = self.write_lock.lock().await;
        Ok(self.database.reset().await?)
    }
}
