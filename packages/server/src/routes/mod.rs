//! Route handlers. Session/cookie parsing is out of scope (`spec.md` §1
//! assumes a `PermissionChecker` interface); callers identify themselves
//! with an `X-Actor-Id` header, the stand-in for the admin UI's removed
//! auth middleware.

pub mod context;
pub mod search;
pub mod webhook;

use axum::http::HeaderMap;
use ragcore::error::PipelineError;

pub const ACTOR_HEADER: &str = "x-actor-id";

pub fn actor_id(headers: &HeaderMap) -> Result<String, PipelineError> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::AccessDenied)
}
