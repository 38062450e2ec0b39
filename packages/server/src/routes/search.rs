//! `POST /agents/{id}/rag/search`.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use ragcore::error::PipelineError;
use ragcore::traits::{Actor, Capability};
use ragcore::types::AgentId;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{ApiError, ApiResponse};
use crate::routes::actor_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
}

pub async fn search(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SearchRequest>,
) -> Result<Json<ApiResponse<ragcore::pipeline::RetrievalResult>>, ApiError> {
    let actor = actor_id(&headers)?;
    Actor::new(&actor).can(Capability::TriggerSearch).check(state.permission_checker.as_ref()).await?;

    let agent_id = Uuid::parse_str(&agent_id).map(AgentId::from).map_err(|_| PipelineError::InvalidInput("invalid agent id".into()))?;

    let result = state.retrieval.search(agent_id, &body.query, body.limit).await?;
    Ok(Json(ApiResponse::ok("search complete", result)))
}
