use async_trait::async_trait;

use crate::error::CatalogResult;

/// Trait for embedding generation.
///
/// The model is an opaque text → vector function; determinism for
/// identical input text and model version is assumed by the pipeline's
/// idempotence guarantee. `model_name`/`dimension` identify the vector
/// space: vectors from different models must never share a collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name identifying the model (and thereby the vector space)
    fn model_name(&self) -> String;

    /// Dimensionality of produced vectors
    fn dimension(&self) -> usize;

    /// Embed a single text
    async fn embed(&self, text: &str) -> CatalogResult<Vec<f32>>;

    /// Embed multiple texts in one batch, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> CatalogResult<Vec<Vec<f32>>>;
}
