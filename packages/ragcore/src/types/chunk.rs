//! Chunk: the retrieval unit stored in the vector collection.

use serde::{Deserialize, Serialize};

use super::document::DocumentType;
use super::ids::{AgentId, ContextDocumentId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub agent_id: AgentId,
    pub document_id: ContextDocumentId,
    pub document_type: DocumentType,
    pub document_title: String,
    pub source: String,
    pub chunk_index: u32,
    pub text: String,
    pub language: Option<String>,
}

/// A chunk paired with its embedding, as handed to the vector store.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}
