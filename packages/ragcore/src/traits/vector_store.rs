//! Vector store interface: per-agent collection of embedded chunks.
//!
//! Grounded on the teacher's `EmbeddingStore` trait and its
//! `cosine_similarity`/tie-break search logic, reshaped to the
//! collection-oriented contract the component design calls for.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{AgentId, Chunk, ChunkPayload, ContextDocumentId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub payload: ChunkPayload,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub exists: bool,
    pub points_count: u64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotent; fixes the collection's vector dimension on first call.
    async fn ensure_collection(&self, agent_id: &AgentId, dimension: usize) -> Result<()>;

    /// Upsert is atomic per call: either every chunk lands or none do.
    async fn upsert_chunks(&self, agent_id: &AgentId, chunks: Vec<Chunk>) -> Result<()>;

    /// Cosine similarity search, higher is better. Ties break by
    /// `documentId` then `chunkIndex`.
    async fn search(&self, agent_id: &AgentId, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    async fn delete_by_document(&self, agent_id: &AgentId, document_id: &ContextDocumentId) -> Result<()>;

    async fn collection_info(&self, agent_id: &AgentId) -> Result<CollectionInfo>;
}

/// Cosine similarity between two vectors of equal length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Sort scored chunks by the contract's tie-break rule: score descending,
/// then `documentId`, then `chunkIndex` ascending.
pub fn sort_by_score_with_tiebreak(hits: &mut [ScoredChunk]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.payload.document_id.as_uuid().cmp(&b.payload.document_id.as_uuid()))
            .then_with(|| a.payload.chunk_index.cmp(&b.payload.chunk_index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_is_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
