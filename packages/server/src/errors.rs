//! Maps `ragcore::PipelineError` onto the HTTP boundary: status code per
//! `PipelineError::status_code()`, message run through the sanitizer,
//! wrapped in the `{success, message, data?}` envelope from `spec.md` §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ragcore::sanitize::sanitize_message;
use ragcore::PipelineError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: message.into(), data: Some(data) }
    }
}

impl ApiResponse<()> {
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: None }
    }
}

/// Wraps a `PipelineError` for `IntoResponse`. `RagDegraded` is success
/// with a warning, per the taxonomy, so it is handled by the caller
/// rather than this type — this wrapper is only for error exits.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = sanitize_message(&self.0.to_string());
        (status, Json(ApiResponse::<()> { success: false, message, data: None })).into_response()
    }
}
