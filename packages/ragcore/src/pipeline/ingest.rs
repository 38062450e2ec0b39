//! Ingestion orchestrator: `ingest(agentId, source)` glues
//! fetch/crawl -> extract -> chunk -> embed -> upsert, persisting the
//! document record before the RAG stage so partial failure downstream is
//! recoverable.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chunk::Chunker;
use crate::crawl::Crawler as SiteCrawler;
use crate::error::{CrawlError, PipelineError, Result};
use crate::extract::{extract_file, extract_html, FileKind};
use crate::fetch::{Fetcher, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT};
use crate::progress::{BusSink, SharedProgressBus};
use crate::sanitize::sanitize_message;
use crate::security::UrlValidator;
use crate::traits::embedder::MAX_EMBED_BATCH;
use crate::traits::{DocumentStore, Embedder, VectorStore};
use crate::types::{
    AgentId, Chunk, ChunkPayload, ChunkerConfig, ContextDocument, ContextDocumentId, CrawlOptions, CrawlProgress,
    DocumentMetadata, DocumentType, RagStatus, WebsiteMetadata,
};

pub const DEFAULT_EMBED_FAN_OUT: usize = 4;

#[derive(Debug, Clone)]
pub enum IngestSource {
    File { bytes: Vec<u8>, filename: String, mime: Option<String> },
    Url(String),
    Website { url: String, options: CrawlOptions },
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub document: ContextDocument,
    /// `true` when the document was persisted but embedding/upsert failed:
    /// the document is readable but not yet searchable.
    pub degraded: bool,
}

pub struct Ingestor {
    document_store: Arc<dyn DocumentStore>,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    fetcher: Arc<Fetcher>,
    crawler: Arc<SiteCrawler>,
    chunker_config: ChunkerConfig,
    embed_fan_out: Arc<Semaphore>,
    progress: SharedProgressBus,
}

impl Ingestor {
    pub fn new(
        document_store: Arc<dyn DocumentStore>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        fetcher: Arc<Fetcher>,
        crawler: Arc<SiteCrawler>,
        progress: SharedProgressBus,
    ) -> Self {
        Self {
            document_store,
            vector_store,
            embedder,
            fetcher,
            crawler,
            chunker_config: ChunkerConfig::default(),
            embed_fan_out: Arc::new(Semaphore::new(DEFAULT_EMBED_FAN_OUT)),
            progress,
        }
    }

    pub async fn ingest(&self, agent_id: AgentId, source: IngestSource, cancel: &CancellationToken) -> Result<IngestOutcome> {
        let (doc_type, filename, url) = match &source {
            IngestSource::File { filename, .. } => (DocumentType::File, Some(filename.clone()), None),
            IngestSource::Url(u) => (DocumentType::Url, None, Some(u.clone())),
            IngestSource::Website { url, .. } => (DocumentType::Website, None, Some(url.clone())),
        };

        if self
            .document_store
            .find_duplicate(&agent_id, doc_type, filename.as_deref(), url.as_deref())
            .await?
            .is_some()
        {
            return Err(PipelineError::Conflict("a document with this source already exists".into()));
        }

        let job_id = agent_id.to_string();
        let sink = BusSink::new(self.progress.clone(), job_id.clone());

        let (content, title, metadata) = self.acquire(&source, &sink, cancel).await?;

        let max_size = doc_type.max_content_size();
        let (content, metadata) = if content.len() > max_size {
            match doc_type {
                DocumentType::Website => {
                    let mut truncated_meta = metadata;
                    truncated_meta.truncated = Some(true);
                    (content.chars().take(max_size).collect(), truncated_meta)
                }
                _ => return Err(PipelineError::TooLarge(format!("content exceeds {max_size} bytes"))),
            }
        } else {
            (content, metadata)
        };

        let mut document = ContextDocument::new(agent_id, doc_type, content, filename.or(title), url);
        document.metadata = metadata;
        self.document_store.insert(document.clone()).await?;

        let outcome = self.run_rag_stage(&mut document, &job_id, cancel).await;
        self.document_store.update(document.clone()).await?;

        match outcome {
            Ok(()) => {
                self.progress.publish(&job_id, CrawlProgress::complete(document_summary(&document))).await;
                Ok(IngestOutcome { document, degraded: false })
            }
            Err(_) => Ok(IngestOutcome { document, degraded: true }),
        }
    }

    /// Re-run acquisition and the RAG stage; deletes the document's prior
    /// chunks before upserting the new ones, so a successful refresh
    /// produces no orphan chunks from an earlier revision.
    pub async fn refresh(&self, agent_id: AgentId, doc_id: ContextDocumentId, cancel: &CancellationToken) -> Result<IngestOutcome> {
        let mut document = self
            .document_store
            .get(&agent_id, &doc_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("document {doc_id}")))?;

        let source = match document.doc_type {
            DocumentType::Url => IngestSource::Url(document.url.clone().unwrap_or_default()),
            DocumentType::Website => IngestSource::Website {
                url: document.url.clone().unwrap_or_default(),
                options: document.metadata.website.clone().map(|w| w.crawl_options).unwrap_or_default(),
            },
            DocumentType::File => {
                return Err(PipelineError::InvalidInput("file documents cannot be refreshed, re-upload instead".into()))
            }
        };

        let job_id = format!("{agent_id}:{doc_id}");
        let sink = BusSink::new(self.progress.clone(), job_id.clone());

        let (content, _title, metadata) = self.acquire(&source, &sink, cancel).await?;
        document.content = content;
        document.content_length = document.content.len();
        document.metadata = metadata;
        document.uploaded_at = Utc::now();

        self.vector_store.delete_by_document(&agent_id, &doc_id).await?;

        let outcome = self.run_rag_stage(&mut document, &job_id, cancel).await;
        self.document_store.update(document.clone()).await?;

        match outcome {
            Ok(()) => {
                self.progress.publish(&job_id, CrawlProgress::complete(document_summary(&document))).await;
                Ok(IngestOutcome { document, degraded: false })
            }
            Err(_) => Ok(IngestOutcome { document, degraded: true }),
        }
    }

    async fn acquire(
        &self,
        source: &IngestSource,
        sink: &BusSink,
        cancel: &CancellationToken,
    ) -> Result<(String, Option<String>, DocumentMetadata)> {
        match source {
            IngestSource::File { bytes, filename, mime } => {
                let kind = mime
                    .as_deref()
                    .and_then(mime_to_kind)
                    .or_else(|| filename.rsplit('.').next().and_then(FileKind::from_extension))
                    .ok_or_else(|| PipelineError::InvalidInput(format!("unrecognized file type: {filename}")))?;
                let extracted = extract_file(bytes, kind)?;
                let metadata = DocumentMetadata {
                    mime_type: mime.clone(),
                    ..Default::default()
                };
                Ok((extracted.text, extracted.title, metadata))
            }
            IngestSource::Url(url) => {
                let validator = UrlValidator::new();
                validator.validate(url).map_err(PipelineError::from)?;
                let fetched = self
                    .fetcher
                    .fetch(url, DEFAULT_TIMEOUT, DEFAULT_MAX_BYTES)
                    .await
                    .map_err(PipelineError::from)?;
                let extracted = extract_html(&fetched.bytes, Some(&fetched.final_url)).map_err(PipelineError::from)?;
                Ok((extracted.text, extracted.title, DocumentMetadata::default()))
            }
            IngestSource::Website { url, options } => {
                let outcome = self.crawler.crawl(url, options, sink, cancel).await.map_err(|e| match e {
                    CrawlError::RobotsBlocked => PipelineError::InvalidInput(sanitize_message(&e.to_string())),
                    other => PipelineError::from(other),
                })?;

                let mut content = String::new();
                let mut page_urls = Vec::new();
                for page in &outcome.pages {
                    content.push_str(&format!("# {}\n\n{}\n\n", page.title.clone().unwrap_or_default(), page.content));
                    page_urls.push(page.url.clone());
                }

                if outcome.partial {
                    warn!(url, "crawl completed with partial results");
                }

                let metadata = DocumentMetadata {
                    website: Some(WebsiteMetadata {
                        base_url: outcome.base_url.clone(),
                        page_urls,
                        total_pages: outcome.total_pages,
                        crawl_options: options.clone(),
                        last_crawled: Some(Utc::now()),
                    }),
                    ..Default::default()
                };

                Ok((content, None, metadata))
            }
        }
    }

    async fn run_rag_stage(&self, document: &mut ContextDocument, job_id: &str, cancel: &CancellationToken) -> Result<()> {
        self.progress.publish(job_id, CrawlProgress::rag(98, "embedding and indexing")).await;

        let result = self.chunk_embed_upsert(document, cancel).await;

        match result {
            Ok(chunks_created) => {
                document.rag_status = RagStatus {
                    processed: true,
                    chunks_created: Some(chunks_created),
                    processed_at: Some(Utc::now()),
                    error: None,
                    attempted_at: Some(Utc::now()),
                };
                Ok(())
            }
            Err(e) => {
                warn!(document_id = %document.id, error = %e, "rag stage failed, marking document degraded");
                document.rag_status = RagStatus {
                    processed: false,
                    chunks_created: None,
                    processed_at: None,
                    error: Some(sanitize_message(&e.to_string())),
                    attempted_at: Some(Utc::now()),
                };
                Err(e)
            }
        }
    }

    async fn chunk_embed_upsert(&self, document: &ContextDocument, cancel: &CancellationToken) -> Result<u32> {
        let chunker = Chunker::new(self.chunker_config);
        let text_chunks = chunker.chunk(&document.content);
        if text_chunks.is_empty() {
            return Ok(0);
        }

        let title = document.filename.clone().unwrap_or_else(|| document.url.clone().unwrap_or_default());
        let source = document.url.clone().unwrap_or_else(|| document.filename.clone().unwrap_or_default());

        let mut handles = Vec::with_capacity(text_chunks.len().div_ceil(MAX_EMBED_BATCH));
        for batch in text_chunks.chunks(MAX_EMBED_BATCH) {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let permit = self.embed_fan_out.clone().acquire_owned().await.expect("semaphore closed");
            let embedder = self.embedder.clone();
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let indices: Vec<u32> = batch.iter().map(|c| c.index).collect();
            let title = title.clone();
            let source = source.clone();
            let agent_id = document.agent_id;
            let document_id = document.id;
            let document_type = document.doc_type;

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let vectors = embedder.embed_batch(&texts).await?;
                let chunks = vectors
                    .into_iter()
                    .zip(texts)
                    .zip(indices)
                    .map(|((vector, text), index)| Chunk {
                        vector,
                        payload: ChunkPayload {
                            agent_id,
                            document_id,
                            document_type,
                            document_title: title.clone(),
                            source: source.clone(),
                            chunk_index: index,
                            text,
                            language: None,
                        },
                    })
                    .collect::<Vec<_>>();
                Ok::<Vec<Chunk>, PipelineError>(chunks)
            }));
        }

        let mut all_chunks = Vec::new();
        for handle in handles {
            let chunks = handle.await.map_err(|e| PipelineError::Internal(e.to_string()))??;
            all_chunks.extend(chunks);
        }

        let dimension = self.embedder.dimension();
        self.vector_store.ensure_collection(&document.agent_id, dimension).await?;
        let created = all_chunks.len() as u32;
        self.vector_store.upsert_chunks(&document.agent_id, all_chunks).await?;

        info!(document_id = %document.id, chunks_created = created, "document indexed");
        Ok(created)
    }
}

/// The `complete` SSE event's `data` payload: the created/updated
/// document, per spec.md §7's "a `complete` event always carries the
/// created/updated document summary".
fn document_summary(document: &ContextDocument) -> serde_json::Value {
    serde_json::to_value(document).unwrap_or_else(|_| serde_json::json!({"documentId": document.id.to_string()}))
}

fn mime_to_kind(mime: &str) -> Option<FileKind> {
    match mime {
        "application/pdf" => Some(FileKind::Pdf),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some(FileKind::Docx),
        "application/msword" => Some(FileKind::Doc),
        "text/plain" => Some(FileKind::Txt),
        "text/markdown" => Some(FileKind::Md),
        "text/csv" => Some(FileKind::Csv),
        _ => None,
    }
}
