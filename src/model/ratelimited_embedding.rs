use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use tracing::{Instrument, debug_span, info_span};

/// Embedding model wrapper that waits for a rate limiter before every call
///
/// Clones share one limiter, so the quota holds across every task that
/// embeds through the same model.
#[derive(Clone)]
pub struct RateLimitedEmbeddingModel<M: EmbeddingModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedEmbeddingModel<M>
where
    M: EmbeddingModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    /// Allow at most `calls` embedding requests per minute
    pub fn per_minute(model: M, calls: NonZeroU32) -> Self {
        Self::new(model, RateLimiter::direct(Quota::per_minute(calls)))
    }

    pub fn inner(&self) -> &M {
        &self.model
    }
}

impl<M: EmbeddingModel> EmbeddingModel for RateLimitedEmbeddingModel<M> {
    const MAX_DOCUMENTS: usize = M::MAX_DOCUMENTS;

    fn ndims(&self) -> usize {
        self.model.ndims()
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        self.model
            .embed_texts(texts)
            .instrument(info_span!("embed_texts"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::HashingEmbeddingModel;

    #[tokio::test]
    async fn test_passes_through_to_inner_model() {
        let model = RateLimitedEmbeddingModel::per_minute(
            HashingEmbeddingModel::new(8),
            NonZeroU32::new(600).unwrap(),
        );

        assert_eq!(model.ndims(), 8);
        assert_eq!(
            <RateLimitedEmbeddingModel<HashingEmbeddingModel> as EmbeddingModel>::MAX_DOCUMENTS,
            HashingEmbeddingModel::MAX_DOCUMENTS
        );

        let embeddings = model
            .embed_texts(vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(model.inner().calls(), 1);
    }
}
