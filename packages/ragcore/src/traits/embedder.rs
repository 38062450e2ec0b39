//! Embedder interface: `texts -> fixed-dimension vectors`.

use async_trait::async_trait;

use crate::error::Result;

/// Maps text to fixed-dimension vectors. Implementations must be
/// deterministic for a given (model, text) pair. Callers batch requests
/// (at most 64 texts per call) and back off on provider rate errors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimension `D` of vectors this embedder produces.
    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        v.pop().ok_or_else(|| crate::error::PipelineError::Internal("embedder returned no vector".into()))
    }
}

pub const MAX_EMBED_BATCH: usize = 64;
