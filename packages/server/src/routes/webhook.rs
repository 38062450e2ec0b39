//! Webhook ingress: `POST /webhook/inbox/{id}`. Returns once the
//! pipeline's pre-process and response stages have completed; main and
//! post-process are spawned in the background so they never delay the 200,
//! following the same subscribe-then-spawn shape `routes::context` uses
//! for website ingestion.

use axum::extract::{Path, State};
use axum::Json;
use ragcore::error::PipelineError;
use ragcore::types::{InboxId, WebhookEvent};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{ApiError, ApiResponse};
use crate::state::AppState;

pub async fn webhook_inbox(
    State(state): State<AppState>,
    Path(inbox_id): Path<String>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let inbox_id = Uuid::parse_str(&inbox_id)
        .map(InboxId::from)
        .map_err(|_| ApiError(PipelineError::InvalidInput("invalid inbox id".into())))?;

    let inbox = state.registry.get_inbox(&inbox_id).ok_or_else(|| ApiError(PipelineError::NotFound(format!("inbox {inbox_id}"))))?;
    let agents = state.registry.all_agents();

    let cancel = CancellationToken::new();
    let foreground = state.pipeline.run_foreground(&inbox, &agents, &event, &cancel).await?;
    let reply = foreground.reply.clone();

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        let outcome = pipeline.run_background(&foreground, &agents, &cancel).await;
        for err in &outcome.main_errors {
            warn!(agent_id = %err.agent_id, error = %err.message, "main-stage agent failed for webhook event");
        }
        for err in &outcome.post_errors {
            warn!(agent_id = %err.agent_id, error = %err.message, "post-process agent failed for webhook event");
        }
    });

    Ok(Json(ApiResponse::ok("event processed", serde_json::json!({ "reply": reply }))))
}
