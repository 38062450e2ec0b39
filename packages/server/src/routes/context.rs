//! Context document ingestion: upload/url/website, refresh, delete, and
//! the non-mutating `test-url`/`test-website` accessibility checks.

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ragcore::error::PipelineError;
use ragcore::pipeline::{IngestOutcome, IngestSource};
use ragcore::traits::{Actor, Capability};
use ragcore::types::{AgentId, ContextDocument, ContextDocumentId, CrawlOptions, DocumentType};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{ApiError, ApiResponse};
use crate::routes::actor_id;
use crate::state::AppState;

const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["pdf", "txt", "doc", "docx", "csv", "md"];

fn parse_agent_id(raw: &str) -> Result<AgentId, ApiError> {
    Uuid::parse_str(raw).map(AgentId::from).map_err(|_| ApiError(PipelineError::InvalidInput("invalid agent id".into())))
}

fn parse_doc_id(raw: &str) -> Result<ContextDocumentId, ApiError> {
    Uuid::parse_str(raw).map(ContextDocumentId::from).map_err(|_| ApiError(PipelineError::InvalidInput("invalid document id".into())))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    document: ContextDocument,
    degraded: bool,
}

impl From<IngestOutcome> for DocumentResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self { document: outcome.document, degraded: outcome.degraded }
    }
}

pub async fn upload(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<DocumentResponse>>, ApiError> {
    let actor = actor_id(&headers)?;
    Actor::new(&actor).can(Capability::ManageContextDocument).check(state.permission_checker.as_ref()).await?;
    let agent_id = parse_agent_id(&agent_id)?;

    let mut filename = None;
    let mut mime = None;
    let mut bytes = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| PipelineError::InvalidInput(e.to_string()))? {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            mime = field.content_type().map(str::to_string);
            bytes = Some(field.bytes().await.map_err(|e| PipelineError::InvalidInput(e.to_string()))?.to_vec());
        }
    }

    let filename = filename.ok_or_else(|| PipelineError::InvalidInput("missing file field".into()))?;
    let bytes = bytes.ok_or_else(|| PipelineError::InvalidInput("missing file contents".into()))?;

    if bytes.len() > state.config.max_upload_bytes {
        return Err(PipelineError::TooLarge(format!("upload exceeds {} bytes", state.config.max_upload_bytes)).into());
    }
    let extension = filename.rsplit('.').next().unwrap_or_default().to_lowercase();
    if !ALLOWED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(PipelineError::InvalidInput(format!("unsupported file extension: {extension}")).into());
    }

    let source = IngestSource::File { bytes, filename, mime };
    let outcome = state.ingestor.ingest(agent_id, source, &CancellationToken::new()).await?;
    Ok(Json(ApiResponse::ok("document ingested", outcome.into())))
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    url: String,
}

pub async fn ingest_url(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UrlRequest>,
) -> Result<Json<ApiResponse<DocumentResponse>>, ApiError> {
    let actor = actor_id(&headers)?;
    Actor::new(&actor).can(Capability::ManageContextDocument).check(state.permission_checker.as_ref()).await?;
    let agent_id = parse_agent_id(&agent_id)?;

    let outcome = state.ingestor.ingest(agent_id, IngestSource::Url(body.url), &CancellationToken::new()).await?;
    Ok(Json(ApiResponse::ok("document ingested", outcome.into())))
}

#[derive(Debug, Deserialize)]
pub struct WebsiteRequest {
    url: String,
    #[serde(default)]
    options: CrawlOptions,
}

pub async fn ingest_website(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<WebsiteRequest>,
) -> Result<Response, ApiError> {
    let actor = actor_id(&headers)?;
    Actor::new(&actor).can(Capability::ManageContextDocument).check(state.permission_checker.as_ref()).await?;
    let agent_id = parse_agent_id(&agent_id)?;
    body.options.validate().map_err(PipelineError::InvalidInput)?;

    let job_id = agent_id.to_string();
    let rx = state.progress.subscribe(&job_id).await;

    let ingestor = state.ingestor.clone();
    let source = IngestSource::Website { url: body.url, options: body.options };
    tokio::spawn(async move {
        if let Err(e) = ingestor.ingest(agent_id, source, &CancellationToken::new()).await {
            warn!(error = %e, "website ingestion failed");
        }
    });

    Ok(crate::sse::progress_stream(rx).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    content: Option<String>,
    filename: Option<String>,
    #[serde(default)]
    refresh_url: bool,
}

pub async fn update_document(
    State(state): State<AppState>,
    Path((agent_id, doc_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<RefreshRequest>,
) -> Result<Response, ApiError> {
    let actor = actor_id(&headers)?;
    Actor::new(&actor).can(Capability::ManageContextDocument).check(state.permission_checker.as_ref()).await?;
    let agent_id = parse_agent_id(&agent_id)?;
    let doc_id = parse_doc_id(&doc_id)?;

    if body.refresh_url {
        let document = state.document_store.get(&agent_id, &doc_id).await?.ok_or_else(|| PipelineError::NotFound(format!("document {doc_id}")))?;

        if document.doc_type == DocumentType::Website {
            let job_id = format!("{agent_id}:{doc_id}");
            let rx = state.progress.subscribe(&job_id).await;
            let ingestor = state.ingestor.clone();
            tokio::spawn(async move {
                if let Err(e) = ingestor.refresh(agent_id, doc_id, &CancellationToken::new()).await {
                    warn!(error = %e, "website refresh failed");
                }
            });
            return Ok(crate::sse::progress_stream(rx).into_response());
        }

        let outcome = state.ingestor.refresh(agent_id, doc_id, &CancellationToken::new()).await?;
        return Ok(Json(ApiResponse::ok("document refreshed", DocumentResponse::from(outcome))).into_response());
    }

    let mut document = state.document_store.get(&agent_id, &doc_id).await?.ok_or_else(|| PipelineError::NotFound(format!("document {doc_id}")))?;
    if let Some(content) = body.content {
        document.content_length = content.len();
        document.content = content;
    }
    if let Some(filename) = body.filename {
        document.filename = Some(filename);
    }
    state.document_store.update(document.clone()).await?;

    Ok(Json(ApiResponse::ok("document updated", DocumentResponse { document, degraded: false })).into_response())
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path((agent_id, doc_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let actor = actor_id(&headers)?;
    Actor::new(&actor).can(Capability::ManageContextDocument).check(state.permission_checker.as_ref()).await?;
    let agent_id = parse_agent_id(&agent_id)?;
    let doc_id = parse_doc_id(&doc_id)?;

    state.document_store.get(&agent_id, &doc_id).await?.ok_or_else(|| PipelineError::NotFound(format!("document {doc_id}")))?;
    state.vector_store.delete_by_document(&agent_id, &doc_id).await?;
    state.document_store.delete(&agent_id, &doc_id).await?;

    Ok(Json(ApiResponse::ok_empty("document deleted")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityReport {
    accessible: bool,
    canonical_url: String,
    detail: Option<String>,
}

pub async fn test_url(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UrlRequest>,
) -> Result<Json<ApiResponse<AccessibilityReport>>, ApiError> {
    let actor = actor_id(&headers)?;
    Actor::new(&actor).can(Capability::ReadContextDocument).check(state.permission_checker.as_ref()).await?;
    let _agent_id = parse_agent_id(&agent_id)?;

    let canonical = state.url_validator.validate(&body.url).map_err(PipelineError::from)?;
    match state.fetcher.fetch(&canonical, ragcore::fetch::DEFAULT_TIMEOUT, ragcore::fetch::DEFAULT_MAX_BYTES).await {
        Ok(_) => Ok(Json(ApiResponse::ok("url is reachable", AccessibilityReport { accessible: true, canonical_url: canonical, detail: None }))),
        Err(e) => Ok(Json(ApiResponse::ok(
            "url check completed",
            AccessibilityReport { accessible: false, canonical_url: canonical, detail: Some(ragcore::sanitize::sanitize_message(&e.to_string())) },
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct WebsiteTestRequest {
    url: String,
}

pub async fn test_website(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<WebsiteTestRequest>,
) -> Result<Json<ApiResponse<AccessibilityReport>>, ApiError> {
    let actor = actor_id(&headers)?;
    Actor::new(&actor).can(Capability::ReadContextDocument).check(state.permission_checker.as_ref()).await?;
    let _agent_id = parse_agent_id(&agent_id)?;

    let canonical = state.url_validator.validate(&body.url).map_err(PipelineError::from)?;

    let parsed = url::Url::parse(&canonical).map_err(|e| PipelineError::InvalidInput(e.to_string()))?;
    let origin = format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or_default());
    let robots = state.robots_cache.get(&reqwest::Client::new(), &origin).await;
    let allowed = robots.is_allowed("RagCoreBot/1.0", parsed.path());

    Ok(Json(ApiResponse::ok(
        "website check completed",
        AccessibilityReport {
            accessible: allowed,
            canonical_url: canonical,
            detail: if allowed { None } else { Some("robots.txt disallows this path".into()) },
        },
    )))
}
