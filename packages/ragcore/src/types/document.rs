//! ContextDocument: one ingested source belonging to an agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::CrawlOptions;
use super::ids::{AgentId, ContextDocumentId};

/// Content size caps from the data model, in bytes of normalized text.
pub const MAX_URL_CONTENT_SIZE: usize = 100 * 1024;
pub const MAX_WEBSITE_CONTENT_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_FILE_CONTENT_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    File,
    Url,
    Website,
}

impl DocumentType {
    pub fn max_content_size(&self) -> usize {
        match self {
            DocumentType::File => MAX_FILE_CONTENT_SIZE,
            DocumentType::Url => MAX_URL_CONTENT_SIZE,
            DocumentType::Website => MAX_WEBSITE_CONTENT_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagStatus {
    pub processed: bool,
    pub chunks_created: Option<u32>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub attempted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteMetadata {
    pub base_url: String,
    pub page_urls: Vec<String>,
    pub total_pages: u32,
    pub crawl_options: CrawlOptions,
    pub last_crawled: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<WebsiteMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDocument {
    pub id: ContextDocumentId,
    pub agent_id: AgentId,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub filename: Option<String>,
    pub url: Option<String>,
    pub content: String,
    pub content_length: usize,
    pub uploaded_at: DateTime<Utc>,
    pub metadata: DocumentMetadata,
    pub rag_status: RagStatus,
}

impl ContextDocument {
    pub fn new(
        agent_id: AgentId,
        doc_type: DocumentType,
        content: String,
        filename: Option<String>,
        url: Option<String>,
    ) -> Self {
        let content_length = content.len();
        Self {
            id: ContextDocumentId::new(),
            agent_id,
            doc_type,
            filename,
            url,
            content,
            content_length,
            uploaded_at: Utc::now(),
            metadata: DocumentMetadata::default(),
            rag_status: RagStatus::default(),
        }
    }
}
