//! Testing utilities including mock implementations.
//!
//! These let callers exercise the pipeline without making real LLM,
//! embedding, or chat-platform calls.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{PipelineError, Result};
use crate::traits::{Capability, ChatPlatform, Embedder, LlmClient, LlmRequest, PermissionChecker};

/// A mock embedder for testing. Returns deterministic, hash-derived
/// vectors by default, or a predefined vector when one was registered.
#[derive(Default)]
pub struct MockEmbedder {
    embeddings: Arc<RwLock<HashMap<String, Vec<f32>>>>,
    dimension: usize,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    pub fn with_embedding(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.embeddings.write().unwrap().insert(text.into(), vector);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    fn deterministic(&self, text: &str) -> Vec<f32> {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();
        (0..self.dimension)
            .map(|i| (hash[i % 32] as f32 / 127.5) - 1.0)
            .collect()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.write().unwrap().extend(texts.iter().cloned());
        let embeddings = self.embeddings.read().unwrap();
        Ok(texts
            .iter()
            .map(|t| embeddings.get(t).cloned().unwrap_or_else(|| self.deterministic(t)))
            .collect())
    }
}

/// A mock LLM client returning predefined or templated responses.
#[derive(Default)]
pub struct MockLlmClient {
    responses: Arc<RwLock<HashMap<String, String>>>,
    should_fail: Arc<RwLock<bool>>,
    calls: Arc<RwLock<Vec<LlmRequest>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, prompt_contains: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.write().unwrap().insert(prompt_contains.into(), response.into());
        self
    }

    pub fn failing(self) -> Self {
        *self.should_fail.write().unwrap() = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<String> {
        if *self.should_fail.read().unwrap() {
            return Err(PipelineError::RemoteFailed("mock llm configured to fail".into()));
        }
        let responses = self.responses.read().unwrap();
        let matched = responses.iter().find(|(k, _)| request.prompt.contains(k.as_str())).map(|(_, v)| v.clone());
        self.calls.write().unwrap().push(request);
        Ok(matched.unwrap_or_else(|| "mock response".into()))
    }
}

/// A mock chat platform recording delivered replies instead of sending
/// them anywhere.
#[derive(Default)]
pub struct MockChatPlatform {
    delivered: Arc<RwLock<Vec<(String, String, String)>>>,
}

impl MockChatPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(String, String, String)> {
        self.delivered.read().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for MockChatPlatform {
    async fn deliver_reply(&self, inbox_id: &str, event_id: &str, reply: &str) -> Result<()> {
        self.delivered
            .write()
            .unwrap()
            .push((inbox_id.to_string(), event_id.to_string(), reply.to_string()));
        Ok(())
    }
}

/// A mock permission checker that allows everything unless the actor is
/// explicitly denied a capability.
#[derive(Default)]
pub struct MockPermissionChecker {
    denials: Arc<RwLock<Vec<(String, Capability)>>>,
}

impl MockPermissionChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(self, actor_id: impl Into<String>, capability: Capability) -> Self {
        self.denials.write().unwrap().push((actor_id.into(), capability));
        self
    }
}

#[async_trait]
impl PermissionChecker for MockPermissionChecker {
    async fn check(&self, actor_id: &str, capability: Capability) -> Result<()> {
        let denied = self.denials.read().unwrap().iter().any(|(id, cap)| id == actor_id && *cap == capability);
        if denied {
            Err(PipelineError::AccessDenied)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(16);
        let a = embedder.embed_one("hello").await.unwrap();
        let b = embedder.embed_one("hello").await.unwrap();
        let c = embedder.embed_one("world").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn mock_embedder_honors_predefined_vectors() {
        let embedder = MockEmbedder::new(2).with_embedding("hi", vec![9.0, 9.0]);
        assert_eq!(embedder.embed_one("hi").await.unwrap(), vec![9.0, 9.0]);
    }

    #[tokio::test]
    async fn mock_llm_returns_matched_response() {
        let llm = MockLlmClient::new().with_response("color", "blue");
        let reply = llm
            .complete(LlmRequest {
                prompt: "what color is the sky".into(),
                temperature: 0.5,
                max_tokens: 100,
                connection_id: None,
                model_id: None,
            })
            .await
            .unwrap();
        assert_eq!(reply, "blue");
    }

    #[tokio::test]
    async fn mock_llm_failing_returns_remote_failed() {
        let llm = MockLlmClient::new().failing();
        let err = llm
            .complete(LlmRequest {
                prompt: "hi".into(),
                temperature: 0.5,
                max_tokens: 10,
                connection_id: None,
                model_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::RemoteFailed(_)));
    }

    #[tokio::test]
    async fn mock_chat_platform_records_deliveries() {
        let chat = MockChatPlatform::new();
        chat.deliver_reply("inbox-1", "event-1", "hello").await.unwrap();
        assert_eq!(chat.delivered().len(), 1);
    }

    #[tokio::test]
    async fn mock_permission_checker_denies_configured_pairs() {
        let checker = MockPermissionChecker::new().deny("user-1", Capability::ManageAgent);
        assert!(checker.check("user-1", Capability::ManageAgent).await.is_err());
        assert!(checker.check("user-1", Capability::ReadAgent).await.is_ok());
    }
}
