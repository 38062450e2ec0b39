//! In-memory vector store and document store, grounded on the teacher's
//! `MemoryStore`. Useful for tests and single-process deployments; data is
//! lost on restart.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::document_store::DocumentStore;
use crate::traits::vector_store::{cosine_similarity, sort_by_score_with_tiebreak, CollectionInfo, ScoredChunk, VectorStore};
use crate::types::{AgentId, Chunk, ContextDocument, ContextDocumentId, DocumentType};

struct Collection {
    dimension: usize,
    points: Vec<Chunk>,
}

#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<AgentId, Collection>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn ensure_collection(&self, agent_id: &AgentId, dimension: usize) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        collections.entry(*agent_id).or_insert_with(|| Collection { dimension, points: Vec::new() });
        Ok(())
    }

    async fn upsert_chunks(&self, agent_id: &AgentId, chunks: Vec<Chunk>) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        let collection = collections
            .entry(*agent_id)
            .or_insert_with(|| Collection { dimension: chunks.first().map(|c| c.vector.len()).unwrap_or(0), points: Vec::new() });
        collection.points.extend(chunks);
        Ok(())
    }

    async fn search(&self, agent_id: &AgentId, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let collections = self.collections.read().unwrap();
        let Some(collection) = collections.get(agent_id) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<ScoredChunk> = collection
            .points
            .iter()
            .map(|chunk| ScoredChunk {
                score: cosine_similarity(query, &chunk.vector),
                payload: chunk.payload.clone(),
            })
            .collect();

        sort_by_score_with_tiebreak(&mut hits);
        hits.truncate(k);
        Ok(hits)
    }

    async fn delete_by_document(&self, agent_id: &AgentId, document_id: &ContextDocumentId) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        if let Some(collection) = collections.get_mut(agent_id) {
            collection.points.retain(|c| c.payload.document_id != *document_id);
        }
        Ok(())
    }

    async fn collection_info(&self, agent_id: &AgentId) -> Result<CollectionInfo> {
        let collections = self.collections.read().unwrap();
        match collections.get(agent_id) {
            Some(collection) => Ok(CollectionInfo {
                exists: true,
                points_count: collection.points.len() as u64,
            }),
            None => Ok(CollectionInfo::default()),
        }
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(AgentId, ContextDocumentId), ContextDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, document: ContextDocument) -> Result<()> {
        let key = (document.agent_id, document.id);
        self.documents.write().unwrap().insert(key, document);
        Ok(())
    }

    async fn get(&self, agent_id: &AgentId, doc_id: &ContextDocumentId) -> Result<Option<ContextDocument>> {
        Ok(self.documents.read().unwrap().get(&(*agent_id, *doc_id)).cloned())
    }

    async fn update(&self, document: ContextDocument) -> Result<()> {
        let key = (document.agent_id, document.id);
        self.documents.write().unwrap().insert(key, document);
        Ok(())
    }

    async fn delete(&self, agent_id: &AgentId, doc_id: &ContextDocumentId) -> Result<()> {
        self.documents.write().unwrap().remove(&(*agent_id, *doc_id));
        Ok(())
    }

    async fn list_for_agent(&self, agent_id: &AgentId) -> Result<Vec<ContextDocument>> {
        Ok(self
            .documents
            .read()
            .unwrap()
            .values()
            .filter(|d| &d.agent_id == agent_id)
            .cloned()
            .collect())
    }

    async fn find_duplicate(
        &self,
        agent_id: &AgentId,
        doc_type: DocumentType,
        filename: Option<&str>,
        url: Option<&str>,
    ) -> Result<Option<ContextDocument>> {
        let documents = self.documents.read().unwrap();
        Ok(documents
            .values()
            .find(|d| {
                &d.agent_id == agent_id
                    && d.doc_type == doc_type
                    && match doc_type {
                        DocumentType::File => d.filename.as_deref() == filename,
                        DocumentType::Url | DocumentType::Website => d.url.as_deref() == url,
                    }
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkPayload, DocumentType};

    fn chunk(agent_id: AgentId, doc_id: ContextDocumentId, idx: u32, vector: Vec<f32>) -> Chunk {
        Chunk {
            vector,
            payload: ChunkPayload {
                agent_id,
                document_id: doc_id,
                document_type: DocumentType::Url,
                document_title: "t".into(),
                source: "s".into(),
                chunk_index: idx,
                text: format!("chunk {idx}"),
                language: None,
            },
        }
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let store = MemoryVectorStore::new();
        let agent = AgentId::new();
        let doc = ContextDocumentId::new();
        store.ensure_collection(&agent, 2).await.unwrap();
        store
            .upsert_chunks(&agent, vec![chunk(agent, doc, 0, vec![1.0, 0.0]), chunk(agent, doc, 1, vec![0.0, 1.0])])
            .await
            .unwrap();

        let hits = store.search(&agent, &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].payload.chunk_index, 0);
    }

    #[tokio::test]
    async fn delete_by_document_removes_all_its_chunks() {
        let store = MemoryVectorStore::new();
        let agent = AgentId::new();
        let doc = ContextDocumentId::new();
        store.ensure_collection(&agent, 2).await.unwrap();
        store
            .upsert_chunks(&agent, vec![chunk(agent, doc, 0, vec![1.0, 0.0]), chunk(agent, doc, 1, vec![0.0, 1.0])])
            .await
            .unwrap();

        store.delete_by_document(&agent, &doc).await.unwrap();
        let info = store.collection_info(&agent).await.unwrap();
        assert_eq!(info.points_count, 0);
    }

    #[tokio::test]
    async fn document_store_finds_duplicate_url() {
        let store = MemoryDocumentStore::new();
        let agent = AgentId::new();
        let doc = ContextDocument::new(agent, DocumentType::Url, "hello".into(), None, Some("https://a.com".into()));
        store.insert(doc).await.unwrap();

        let dup = store
            .find_duplicate(&agent, DocumentType::Url, None, Some("https://a.com"))
            .await
            .unwrap();
        assert!(dup.is_some());
    }
}
