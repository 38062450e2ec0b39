//! Production-grade Postgres + pgvector backed stores, grounded on the
//! teacher's `PostgresStore` (capability detection, versioned migrations
//! run at construction time).

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::traits::document_store::DocumentStore;
use crate::traits::vector_store::{cosine_similarity, sort_by_score_with_tiebreak, CollectionInfo, ScoredChunk, VectorStore};
use crate::types::{AgentId, Chunk, ChunkPayload, ContextDocument, ContextDocumentId, DocumentMetadata, DocumentType, RagStatus};

pub struct PostgresStore {
    pool: PgPool,
    has_pgvector: bool,
}

impl PostgresStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        let mut store = Self { pool, has_pgvector: false };
        store.detect_capabilities().await?;
        store.run_migrations().await?;
        Ok(store)
    }

    async fn detect_capabilities(&mut self) -> Result<()> {
        let row: Option<(String,)> = sqlx::query_as("SELECT extname FROM pg_extension WHERE extname = 'vector'")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        self.has_pgvector = row.is_some();
        if !self.has_pgvector {
            warn!("pgvector extension not installed; attempting to create it");
            sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
                .execute(&self.pool)
                .await
                .map_err(|e| PipelineError::Internal(e.to_string()))?;
            self.has_pgvector = true;
        }
        Ok(())
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS context_documents (
                id UUID PRIMARY KEY,
                agent_id UUID NOT NULL,
                doc_type TEXT NOT NULL,
                filename TEXT,
                url TEXT,
                content TEXT NOT NULL,
                content_length BIGINT NOT NULL,
                uploaded_at TIMESTAMPTZ NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{}',
                rag_status JSONB NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Internal(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_context_documents_agent ON context_documents(agent_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                agent_id UUID NOT NULL,
                document_id UUID NOT NULL,
                chunk_index INT NOT NULL,
                document_type TEXT NOT NULL,
                document_title TEXT NOT NULL,
                source TEXT NOT NULL,
                text TEXT NOT NULL,
                language TEXT,
                embedding VECTOR,
                PRIMARY KEY (agent_id, document_id, chunk_index)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Internal(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_agent ON chunks(agent_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        info!("postgres store migrations applied");
        Ok(())
    }
}

#[async_trait]
impl VectorStore for PostgresStore {
    async fn ensure_collection(&self, _agent_id: &AgentId, _dimension: usize) -> Result<()> {
        // Collections are rows scoped by agent_id in a shared table; the
        // schema is fixed at migration time, so ensure_collection is a
        // no-op beyond what run_migrations already created.
        Ok(())
    }

    async fn upsert_chunks(&self, agent_id: &AgentId, chunks: Vec<Chunk>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| PipelineError::Internal(e.to_string()))?;
        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO chunks (agent_id, document_id, chunk_index, document_type, document_title, source, text, language, embedding)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (agent_id, document_id, chunk_index)
                DO UPDATE SET text = EXCLUDED.text, embedding = EXCLUDED.embedding, document_title = EXCLUDED.document_title
                "#,
            )
            .bind(agent_id.as_uuid())
            .bind(chunk.payload.document_id.as_uuid())
            .bind(chunk.payload.chunk_index as i32)
            .bind(format!("{:?}", chunk.payload.document_type).to_lowercase())
            .bind(&chunk.payload.document_title)
            .bind(&chunk.payload.source)
            .bind(&chunk.payload.text)
            .bind(&chunk.payload.language)
            .bind(Vector::from(chunk.vector))
            .execute(&mut *tx)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        }
        tx.commit().await.map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn search(&self, agent_id: &AgentId, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let rows = sqlx::query(
            "SELECT document_id, chunk_index, document_type, document_title, source, text, language, embedding FROM chunks WHERE agent_id = $1",
        )
        .bind(agent_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::Internal(e.to_string()))?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding: Vector = row.try_get("embedding").map_err(|e| PipelineError::Internal(e.to_string()))?;
            let document_id: Uuid = row.try_get("document_id").map_err(|e| PipelineError::Internal(e.to_string()))?;
            let document_type_str: String = row.try_get("document_type").unwrap_or_default();
            let score = cosine_similarity(query, embedding.as_slice());
            hits.push(ScoredChunk {
                score,
                payload: ChunkPayload {
                    agent_id: *agent_id,
                    document_id: document_id.into(),
                    document_type: document_type_from_str(&document_type_str),
                    document_title: row.try_get("document_title").unwrap_or_default(),
                    source: row.try_get("source").unwrap_or_default(),
                    chunk_index: row.try_get::<i32, _>("chunk_index").unwrap_or(0) as u32,
                    text: row.try_get("text").unwrap_or_default(),
                    language: row.try_get("language").ok(),
                },
            });
        }

        sort_by_score_with_tiebreak(&mut hits);
        hits.truncate(k);
        Ok(hits)
    }

    async fn delete_by_document(&self, agent_id: &AgentId, document_id: &ContextDocumentId) -> Result<()> {
        sqlx::query("DELETE FROM chunks WHERE agent_id = $1 AND document_id = $2")
            .bind(agent_id.as_uuid())
            .bind(document_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn collection_info(&self, agent_id: &AgentId) -> Result<CollectionInfo> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM chunks WHERE agent_id = $1")
            .bind(agent_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        let count: i64 = row.try_get("count").unwrap_or(0);
        Ok(CollectionInfo {
            exists: true,
            points_count: count as u64,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn insert(&self, document: ContextDocument) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO context_documents (id, agent_id, doc_type, filename, url, content, content_length, uploaded_at, metadata, rag_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(document.agent_id.as_uuid())
        .bind(format!("{:?}", document.doc_type).to_lowercase())
        .bind(&document.filename)
        .bind(&document.url)
        .bind(&document.content)
        .bind(document.content_length as i64)
        .bind(document.uploaded_at)
        .bind(serde_json::to_value(&document.metadata).unwrap_or_default())
        .bind(serde_json::to_value(&document.rag_status).unwrap_or_default())
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, agent_id: &AgentId, doc_id: &ContextDocumentId) -> Result<Option<ContextDocument>> {
        let row = sqlx::query("SELECT * FROM context_documents WHERE agent_id = $1 AND id = $2")
            .bind(agent_id.as_uuid())
            .bind(doc_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok(row.map(row_to_document))
    }

    async fn update(&self, document: ContextDocument) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE context_documents SET content = $1, content_length = $2, metadata = $3, rag_status = $4, filename = $5
            WHERE agent_id = $6 AND id = $7
            "#,
        )
        .bind(&document.content)
        .bind(document.content_length as i64)
        .bind(serde_json::to_value(&document.metadata).unwrap_or_default())
        .bind(serde_json::to_value(&document.rag_status).unwrap_or_default())
        .bind(&document.filename)
        .bind(document.agent_id.as_uuid())
        .bind(document.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, agent_id: &AgentId, doc_id: &ContextDocumentId) -> Result<()> {
        sqlx::query("DELETE FROM context_documents WHERE agent_id = $1 AND id = $2")
            .bind(agent_id.as_uuid())
            .bind(doc_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn list_for_agent(&self, agent_id: &AgentId) -> Result<Vec<ContextDocument>> {
        let rows = sqlx::query("SELECT * FROM context_documents WHERE agent_id = $1")
            .bind(agent_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok(rows.into_iter().map(row_to_document).collect())
    }

    async fn find_duplicate(
        &self,
        agent_id: &AgentId,
        doc_type: DocumentType,
        filename: Option<&str>,
        url: Option<&str>,
    ) -> Result<Option<ContextDocument>> {
        let type_str = format!("{doc_type:?}").to_lowercase();
        let row = match doc_type {
            DocumentType::File => {
                sqlx::query("SELECT * FROM context_documents WHERE agent_id = $1 AND doc_type = $2 AND filename = $3")
                    .bind(agent_id.as_uuid())
                    .bind(type_str)
                    .bind(filename)
                    .fetch_optional(&self.pool)
                    .await
            }
            DocumentType::Url | DocumentType::Website => {
                sqlx::query("SELECT * FROM context_documents WHERE agent_id = $1 AND doc_type = $2 AND url = $3")
                    .bind(agent_id.as_uuid())
                    .bind(type_str)
                    .bind(url)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| PipelineError::Internal(e.to_string()))?;
        Ok(row.map(row_to_document))
    }
}

fn document_type_from_str(s: &str) -> DocumentType {
    match s {
        "file" => DocumentType::File,
        "website" => DocumentType::Website,
        _ => DocumentType::Url,
    }
}

fn row_to_document(row: sqlx::postgres::PgRow) -> ContextDocument {
    let doc_type_str: String = row.try_get("doc_type").unwrap_or_default();
    let doc_type = document_type_from_str(&doc_type_str);
    let metadata: serde_json::Value = row.try_get("metadata").unwrap_or_default();
    let rag_status: serde_json::Value = row.try_get("rag_status").unwrap_or_default();
    let id: Uuid = row.try_get("id").unwrap_or_default();
    let agent_id: Uuid = row.try_get("agent_id").unwrap_or_default();

    ContextDocument {
        id: id.into(),
        agent_id: agent_id.into(),
        doc_type,
        filename: row.try_get("filename").ok(),
        url: row.try_get("url").ok(),
        content: row.try_get("content").unwrap_or_default(),
        content_length: row.try_get::<i64, _>("content_length").unwrap_or(0) as usize,
        uploaded_at: row.try_get("uploaded_at").unwrap_or_else(|_| chrono::Utc::now()),
        metadata: serde_json::from_value(metadata).unwrap_or_else(|_| DocumentMetadata::default()),
        rag_status: serde_json::from_value(rag_status).unwrap_or_else(|_| RagStatus::default()),
    }
}
