//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Trait for converting text into fixed-dimension embedding vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts.
    ///
    /// Returns one vector per input in the same order, each of
    /// [`dimensions`](Self::dimensions) length. Implementations batch
    /// requests to the external model up to their batch-size limit.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::Error::embedding("provider returned no vectors"))
    }

    /// Embedding dimensionality, constant for the life of the provider
    fn dimensions(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}
