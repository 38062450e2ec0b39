//! Router assembly, grounded on the teacher's `server::app::build_app`
//! layering order (CORS -> trace -> rate-limit governor -> routes), minus
//! its GraphQL/Restate/NATS/Twilio/Seesaw layers, which have no
//! counterpart in this spec.

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::ApiResponse;
use crate::routes::{context, search, webhook};
use crate::state::AppState;

async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::ok_empty("ok"))
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any);

    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .finish()
            .expect("rate limiter configuration is valid"),
    );

    let router = Router::new()
        .route("/health", get(health))
        .route("/webhook/inbox/:id", post(webhook::webhook_inbox))
        .route("/agents/:id/context/upload", post(context::upload))
        .route("/agents/:id/context/url", post(context::ingest_url))
        .route("/agents/:id/context/website", post(context::ingest_website))
        .route("/agents/:id/context/test-url", post(context::test_url))
        .route("/agents/:id/context/test-website", post(context::test_website))
        .route("/agents/:id/context/:docId", put(context::update_document).delete(context::delete_document))
        .route("/agents/:id/rag/search", post(search::search));

    router
        .layer(GovernorLayer { config: governor_config })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
