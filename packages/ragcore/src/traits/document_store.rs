//! ContextDocument persistence, keyed by `(agentId, docId)`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AgentId, ContextDocument, ContextDocumentId, DocumentType};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, document: ContextDocument) -> Result<()>;

    async fn get(&self, agent_id: &AgentId, doc_id: &ContextDocumentId) -> Result<Option<ContextDocument>>;

    async fn update(&self, document: ContextDocument) -> Result<()>;

    async fn delete(&self, agent_id: &AgentId, doc_id: &ContextDocumentId) -> Result<()>;

    async fn list_for_agent(&self, agent_id: &AgentId) -> Result<Vec<ContextDocument>>;

    /// Find an existing document by the uniqueness keys named in the data
    /// model: `(agentId, filename)` for files, `(agentId, url)` for
    /// url/website documents.
    async fn find_duplicate(
        &self,
        agent_id: &AgentId,
        doc_type: DocumentType,
        filename: Option<&str>,
        url: Option<&str>,
    ) -> Result<Option<ContextDocument>>;
}
