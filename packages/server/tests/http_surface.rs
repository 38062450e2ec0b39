//! HTTP-level integration tests against the routes in `spec.md` §6,
//! exercising the router with `tower::util::ServiceExt::oneshot` rather
//! than binding a real listener.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ragcore::crawl::{Crawler, HostLimiters, RobotsCache};
use ragcore::fetch::Fetcher;
use ragcore::inbox::PipelineExecutor;
use ragcore::pipeline::{Ingestor, RetrievalService};
use ragcore::progress::ProgressBus;
use ragcore::security::UrlValidator;
use ragcore::stores::{MemoryDocumentStore, MemoryVectorStore};
use ragcore::testing::{MockEmbedder, MockLlmClient};
use ragcore::traits::{ChatPlatform, DocumentStore, Embedder, LlmClient, PermissionChecker, VectorStore};
use ragcore::types::{AgentId, Chunk, ChunkPayload, DocumentType};
use serde_json::{json, Value};
use server_core::adapters::chat::LoggingChatPlatform;
use server_core::adapters::permission::AdminListPermissionChecker;
use server_core::app::build_app;
use server_core::config::Config;
use server_core::registry::Registry;
use server_core::state::AppState;
use tower::util::ServiceExt;

fn test_config() -> Config {
    Config {
        port: 0,
        database_url: None,
        admin_actor_ids: vec!["admin-1".to_string()],
        default_max_pages: 10,
        default_max_depth: 2,
        embed_fan_out: 4,
        max_upload_bytes: 10 * 1024 * 1024,
    }
}

/// Wires an `AppState` with deterministic, injectable collaborators
/// instead of `wire_default`'s environment-dependent embedder choice, so
/// search-ranking assertions don't depend on whichever `MockEmbedder`
/// hash happens to fall out of a 16-dimension default.
fn wire_test_state(embedder: MockEmbedder) -> AppState {
    let document_store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let vector_store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
    let permission_checker: Arc<dyn PermissionChecker> = Arc::new(AdminListPermissionChecker::new(vec!["admin-1".to_string()]));
    let chat: Arc<dyn ChatPlatform> = Arc::new(LoggingChatPlatform);
    let embedder: Arc<dyn Embedder> = Arc::new(embedder);
    let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::new());

    let validator = Arc::new(UrlValidator::new());
    let fetcher = Arc::new(Fetcher::new(validator.clone()));
    let limiters = Arc::new(HostLimiters::default());
    let robots = Arc::new(RobotsCache::new());
    let crawler = Arc::new(Crawler::new(fetcher.clone(), limiters, robots.clone()));
    let progress = Arc::new(ProgressBus::new());

    let ingestor = Arc::new(Ingestor::new(document_store.clone(), vector_store.clone(), embedder.clone(), fetcher.clone(), crawler.clone(), progress.clone()));
    let retrieval = Arc::new(RetrievalService::new(vector_store.clone(), embedder));
    let pipeline = Arc::new(PipelineExecutor::new(retrieval.clone(), llm, chat));

    AppState {
        config: Arc::new(test_config()),
        registry: Arc::new(Registry::new()),
        document_store,
        vector_store,
        ingestor,
        retrieval,
        pipeline,
        permission_checker,
        progress,
        crawler,
        fetcher,
        url_validator: validator,
        robots_cache: robots,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = build_app(AppState::wire_default(test_config()));

    let response = app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_without_actor_header_is_denied() {
    let app = build_app(AppState::wire_default(test_config()));

    let request = Request::builder()
        .method("POST")
        .uri(format!("/agents/{}/rag/search", AgentId::new()))
        .header("content-type", "application/json")
        .body(Body::from(json!({"query": "hello", "limit": 3}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn context_url_rejects_private_host_without_fetching() {
    let app = build_app(AppState::wire_default(test_config()));
    let agent_id = AgentId::new();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/agents/{agent_id}/context/url"))
        .header("content-type", "application/json")
        .header("x-actor-id", "admin-1")
        .body(Body::from(json!({"url": "http://127.0.0.1/admin"}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn search_ranks_hits_by_similarity() {
    let state = wire_test_state(MockEmbedder::new(2).with_embedding("what color is the sky", vec![1.0, 0.0]));
    let agent_id = AgentId::new();
    let document_id = ragcore::types::ContextDocumentId::new();

    state.vector_store.ensure_collection(&agent_id, 2).await.unwrap();
    state
        .vector_store
        .upsert_chunks(
            &agent_id,
            vec![
                Chunk {
                    vector: vec![1.0, 0.0],
                    payload: ChunkPayload {
                        agent_id,
                        document_id,
                        document_type: DocumentType::Url,
                        document_title: "Doc A".into(),
                        source: "https://a.example".into(),
                        chunk_index: 0,
                        text: "the sky is blue".into(),
                        language: None,
                    },
                },
                Chunk {
                    vector: vec![0.0, 1.0],
                    payload: ChunkPayload {
                        agent_id,
                        document_id,
                        document_type: DocumentType::Url,
                        document_title: "Doc B".into(),
                        source: "https://b.example".into(),
                        chunk_index: 0,
                        text: "engines burn fuel".into(),
                        language: None,
                    },
                },
            ],
        )
        .await
        .unwrap();

    let app = build_app(state);

    let request = Request::builder()
        .method("POST")
        .uri(format!("/agents/{agent_id}/rag/search"))
        .header("content-type", "application/json")
        .header("x-actor-id", "admin-1")
        .body(Body::from(json!({"query": "what color is the sky", "limit": 2}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["hits"][0]["rank"], json!(1));
    assert_eq!(body["data"]["hits"][0]["documentTitle"], json!("Doc A"));
}

#[tokio::test]
async fn webhook_to_unknown_inbox_returns_not_found() {
    let app = build_app(AppState::wire_default(test_config()));

    let request = Request::builder()
        .method("POST")
        .uri(format!("/webhook/inbox/{}", ragcore::types::InboxId::new()))
        .header("content-type", "application/json")
        .body(Body::from(json!({"event": "message_created", "message": {"text": "hi"}}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_document_returns_not_found() {
    let app = build_app(AppState::wire_default(test_config()));
    let agent_id = AgentId::new();
    let doc_id = ragcore::types::ContextDocumentId::new();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/agents/{agent_id}/context/{doc_id}"))
        .header("x-actor-id", "admin-1")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
