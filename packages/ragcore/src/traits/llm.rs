//! LLM provider interface: accepts a prompt, returns text.

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub connection_id: Option<String>,
    pub model_id: Option<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<String>;
}
