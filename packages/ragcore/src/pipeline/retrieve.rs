//! Retrieval service: `search(agentId, queryText, k)` assembles ranked
//! hits and a per-document summary, grounded on the teacher's
//! `pipeline/recall.rs` hybrid-recall shape but narrowed to a single
//! vector-similarity signal.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::traits::{CollectionInfo, Embedder, VectorStore};
use crate::types::{AgentId, DocumentType};

pub const MIN_K: usize = 1;
pub const MAX_K: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalHit {
    pub rank: usize,
    pub score: f32,
    pub relevance_percentage: u32,
    pub text: String,
    pub document_title: String,
    pub document_type: DocumentType,
    /// 1-based, i.e. the stored `chunkIndex + 1`.
    pub chunk_index: u32,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub title: String,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub source: String,
    pub chunks: u32,
    pub best_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub collection_exists: bool,
    pub hits: Vec<RetrievalHit>,
    pub document_summary: Vec<DocumentSummary>,
}

impl RetrievalResult {
    fn empty(info: CollectionInfo) -> Self {
        Self {
            collection_exists: info.exists,
            hits: Vec::new(),
            document_summary: Vec::new(),
        }
    }
}

pub struct RetrievalService {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalService {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { vector_store, embedder }
    }

    pub async fn search(&self, agent_id: AgentId, query_text: &str, k: usize) -> Result<RetrievalResult> {
        let trimmed = query_text.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidInput("query must not be empty".into()));
        }
        if !(MIN_K..=MAX_K).contains(&k) {
            return Err(PipelineError::InvalidInput(format!("k must be within [{MIN_K}, {MAX_K}]")));
        }

        let info = self.vector_store.collection_info(&agent_id).await?;
        if !info.exists || info.points_count == 0 {
            return Ok(RetrievalResult::empty(info));
        }

        let query_vector = self.embedder.embed_one(trimmed).await?;
        let scored = self.vector_store.search(&agent_id, &query_vector, k).await?;

        let hits: Vec<RetrievalHit> = scored
            .iter()
            .enumerate()
            .map(|(i, hit)| RetrievalHit {
                rank: i + 1,
                score: hit.score,
                relevance_percentage: (hit.score * 100.0).round().clamp(0.0, 100.0) as u32,
                text: hit.payload.text.clone(),
                document_title: hit.payload.document_title.clone(),
                document_type: hit.payload.document_type,
                chunk_index: hit.payload.chunk_index + 1,
                source: hit.payload.source.clone(),
            })
            .collect();

        let mut grouped: HashMap<(String, DocumentType), (String, u32, f32)> = HashMap::new();
        for hit in &hits {
            let key = (hit.document_title.clone(), hit.document_type);
            grouped
                .entry(key)
                .and_modify(|(_, chunks, best_score)| {
                    *chunks += 1;
                    if hit.score > *best_score {
                        *best_score = hit.score;
                    }
                })
                .or_insert_with(|| (hit.source.clone(), 1, hit.score));
        }

        let mut document_summary: Vec<DocumentSummary> = grouped
            .into_iter()
            .map(|((title, document_type), (source, chunks, best_score))| DocumentSummary {
                title,
                document_type,
                source,
                chunks,
                best_score,
            })
            .collect();
        document_summary.sort_by(|a, b| b.best_score.partial_cmp(&a.best_score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(RetrievalResult {
            collection_exists: info.exists,
            hits,
            document_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::types::{Chunk, ChunkPayload, ContextDocumentId};

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn payload(agent_id: AgentId, document_id: ContextDocumentId, title: &str, idx: u32, text: &str) -> ChunkPayload {
        ChunkPayload {
            agent_id,
            document_id,
            document_type: DocumentType::Url,
            document_title: title.into(),
            source: format!("https://example.com/{title}"),
            chunk_index: idx,
            text: text.into(),
            language: None,
        }
    }

    #[tokio::test]
    async fn rejects_empty_query() {
        let store = Arc::new(crate::stores::MemoryVectorStore::new());
        let service = RetrievalService::new(store, Arc::new(StubEmbedder));
        let err = service.search(AgentId::new(), "   ", 5).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rejects_k_out_of_range() {
        let store = Arc::new(crate::stores::MemoryVectorStore::new());
        let service = RetrievalService::new(store, Arc::new(StubEmbedder));
        assert!(service.search(AgentId::new(), "hi", 0).await.is_err());
        assert!(service.search(AgentId::new(), "hi", 21).await.is_err());
    }

    #[tokio::test]
    async fn empty_collection_short_circuits() {
        let store = Arc::new(crate::stores::MemoryVectorStore::new());
        let service = RetrievalService::new(store, Arc::new(StubEmbedder));
        let result = service.search(AgentId::new(), "hello", 5).await.unwrap();
        assert!(!result.collection_exists);
        assert!(result.hits.is_empty());
    }

    #[tokio::test]
    async fn search_assembles_ranked_hits_and_summary() {
        let store = Arc::new(crate::stores::MemoryVectorStore::new());
        let agent = AgentId::new();
        let doc = ContextDocumentId::new();
        store.ensure_collection(&agent, 2).await.unwrap();
        store
            .upsert_chunks(
                &agent,
                vec![
                    Chunk { vector: vec![1.0, 0.0], payload: payload(agent, doc, "Doc A", 0, "the sky is blue") },
                    Chunk { vector: vec![0.0, 1.0], payload: payload(agent, doc, "Doc A", 1, "engines burn fuel") },
                ],
            )
            .await
            .unwrap();

        let service = RetrievalService::new(store, Arc::new(StubEmbedder));
        let result = service.search(agent, "what color is the sky", 2).await.unwrap();

        assert!(result.collection_exists);
        assert_eq!(result.hits[0].rank, 1);
        assert_eq!(result.hits[0].chunk_index, 1);
        assert_eq!(result.hits[0].relevance_percentage, 100);
        assert_eq!(result.document_summary.len(), 1);
        assert_eq!(result.document_summary[0].chunks, 2);
    }
}
