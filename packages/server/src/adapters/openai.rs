//! Reqwest-based `Embedder`/`LlmClient` adapters against an
//! OpenAI-compatible HTTP API, replacing the teacher's path-dependency
//! `openai-client`/`rig-core` stack (neither ships against a registry
//! crate index) with the same request shapes over the teacher's existing
//! `reqwest` dependency.

use async_trait::async_trait;
use ragcore::error::{PipelineError, Result};
use ragcore::traits::{Embedder, LlmClient, LlmRequest};
use serde::Deserialize;
use serde_json::json;

pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub embedding_dimension: usize,
}

impl OpenAiConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        Some(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            embedding_model: std::env::var("OPENAI_EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".into()),
            chat_model: std::env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            embedding_dimension: std::env::var("OPENAI_EMBEDDING_DIMENSION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1536),
        })
    }
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiEmbedder {
    pub fn new(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimension(&self) -> usize {
        self.config.embedding_dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "model": self.config.embedding_model, "input": texts }))
            .send()
            .await
            .map_err(|e| PipelineError::RemoteFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::RemoteFailed(format!("embeddings endpoint returned {}", response.status())));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| PipelineError::RemoteFailed(e.to_string()))?;
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

pub struct OpenAiLlmClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiLlmClient {
    pub fn new(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<String> {
        let model = request.model_id.as_deref().unwrap_or(&self.config.chat_model);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": model,
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
                "messages": [{ "role": "user", "content": request.prompt }],
            }))
            .send()
            .await
            .map_err(|e| PipelineError::RemoteFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::RemoteFailed(format!("chat completions endpoint returned {}", response.status())));
        }

        let mut parsed: ChatResponse = response.json().await.map_err(|e| PipelineError::RemoteFailed(e.to_string()))?;
        let choice = parsed.choices.pop().ok_or_else(|| PipelineError::RemoteFailed("no choices in response".into()))?;
        Ok(choice.message.content)
    }
}
