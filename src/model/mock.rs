//! Deterministic embedding model for tests
//!
//! Each text is embedded by hashing its bytes into a fixed number of buckets,
//! so equal texts always get equal vectors and no network is involved.

use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub struct HashingEmbeddingModel {
    dims: usize,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl HashingEmbeddingModel {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            calls: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every following call fail
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Number of `embed_texts` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.dims];
        for (i, byte) in text.bytes().enumerate() {
            vec[(i + byte as usize) % self.dims] += f64::from(byte) / 255.0;
        }
        vec
    }
}

impl EmbeddingModel for HashingEmbeddingModel {
    // small on purpose so batching is exercised
    const MAX_DOCUMENTS: usize = 3;

    fn ndims(&self) -> usize {
        self.dims
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::ProviderError("mock failure".to_string()));
        }

        Ok(texts
            .into_iter()
            .map(|document| Embedding {
                vec: self.embed(&document),
                document,
            })
            .collect())
    }
}
