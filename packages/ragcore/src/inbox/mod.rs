//! Inbox pipeline executor: priority-ordered, partially-parallel
//! execution of the agents attached to an inbox for one webhook event.
//!
//! New orchestration code; sequencing follows the teacher's use of
//! `futures::future::join_all` for all-settled fan-out throughout
//! `server/src/domains/*/effects`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::pipeline::retrieve::RetrievalService;
use crate::sanitize::sanitize_message;
use crate::traits::{ChatPlatform, LlmClient, LlmRequest};
use crate::types::{Agent, AgentId, Inbox, InboxAgent, WebhookEvent, MAIN_CEILING, PRE_PROCESS_CEILING};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_LLM_DEADLINE: Duration = Duration::from_secs(60);

/// Failure of a single non-response-agent stage invocation; recorded, not
/// propagated.
#[derive(Debug, Clone)]
pub struct StageError {
    pub agent_id: AgentId,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The reply delivered by the response agent, if any.
    pub reply: Option<String>,
    pub main_errors: Vec<StageError>,
    pub post_errors: Vec<StageError>,
}

/// Result of the synchronous portion of a run (pre-process + response
/// agent), plus everything `run_background` needs to finish the rest
/// without borrowing from the caller's `Inbox`/event.
pub struct ForegroundOutcome {
    pub reply: Option<String>,
    context: Value,
    main: Vec<InboxAgent>,
    post: Vec<InboxAgent>,
}

pub struct PipelineExecutor {
    retrieval: Arc<RetrievalService>,
    llm: Arc<dyn LlmClient>,
    chat: Arc<dyn ChatPlatform>,
}

impl PipelineExecutor {
    pub fn new(retrieval: Arc<RetrievalService>, llm: Arc<dyn LlmClient>, chat: Arc<dyn ChatPlatform>) -> Self {
        Self { retrieval, llm, chat }
    }

    /// Runs pre-process (sequential) and the response agent (sequential),
    /// then returns. The caller is expected to hand the returned `main`/
    /// `post` agents and `context` to `run_background` — spawned rather
    /// than awaited — so the main/post stages never delay the response,
    /// per the contract that they "run to completion but do not delay
    /// the response".
    ///
    /// Pre-process and response-agent failures propagate as `Err`, per
    /// the contract that they are "surfaced to the caller as the event's
    /// status".
    pub async fn run_foreground(
        &self,
        inbox: &Inbox,
        agents: &HashMap<AgentId, Agent>,
        event: &WebhookEvent,
        cancel: &CancellationToken,
    ) -> Result<ForegroundOutcome> {
        let mut ordered: Vec<&InboxAgent> = inbox.agents.iter().filter(|a| a.is_active).collect();
        ordered.sort_by_key(|a| a.priority);

        let pre: Vec<&InboxAgent> = ordered.iter().filter(|a| a.priority < PRE_PROCESS_CEILING).copied().collect();
        let main: Vec<InboxAgent> = ordered
            .iter()
            .filter(|a| a.priority >= PRE_PROCESS_CEILING && a.priority < MAIN_CEILING)
            .map(|a| (*a).clone())
            .collect();
        let post: Vec<InboxAgent> = ordered.iter().filter(|a| a.priority >= MAIN_CEILING).map(|a| (*a).clone()).collect();

        let mut context = event.message.clone();

        for stage_agent in pre {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let Some(agent) = agents.get(&stage_agent.agent_id) else {
                continue;
            };
            let output = self.invoke_agent(agent, &context, cancel).await.map_err(|e| {
                warn!(agent_id = %agent.id, error = %e, "pre-process agent failed, aborting pipeline");
                e
            })?;
            merge_context(&mut context, &agent.id, &output);
        }

        let reply = if let Some(response) = &inbox.response_agent {
            let Some(agent) = agents.get(&response.agent_id) else {
                return Err(PipelineError::NotFound(format!("response agent {}", response.agent_id)));
            };

            let query_text = extract_query_text(&context);
            let retrieval = self.retrieval.search(agent.id, &query_text, DEFAULT_TOP_K).await?;

            let context_block = retrieval
                .hits
                .iter()
                .map(|h| format!("[{}] {}", h.document_title, h.text))
                .collect::<Vec<_>>()
                .join("\n\n");

            let prompt = format!("{}\n\nContext:\n{}\n\nUser message:\n{}", agent.prompt, context_block, query_text);

            let request = LlmRequest {
                prompt,
                temperature: response.config.temperature,
                max_tokens: response.config.max_tokens,
                connection_id: response.config.connection_id.clone(),
                model_id: response.config.model_id.clone(),
            };

            let reply_text = tokio::time::timeout(DEFAULT_LLM_DEADLINE, self.llm.complete(request))
                .await
                .map_err(|_| PipelineError::Cancelled)??;

            if response.config.response_delay_sec > 0 {
                tokio::time::sleep(Duration::from_secs(response.config.response_delay_sec as u64)).await;
            }

            let inbox_id = inbox.id.to_string();
            let event_id = event.event.clone();
            self.chat.deliver_reply(&inbox_id, &event_id, &reply_text).await?;

            Some(reply_text)
        } else {
            None
        };

        info!(pre_len = %ordered.len(), main_len = main.len(), post_len = post.len(), "pipeline foreground stage finished");

        Ok(ForegroundOutcome { reply, context, main, post })
    }

    /// Runs the main stage (parallel, all-settled) followed by
    /// post-process (sequential) against the context `run_foreground`
    /// assembled. Meant to be driven inside a `tokio::spawn`ed task after
    /// the caller has already responded to the triggering request; failures
    /// here are recorded, never propagated.
    pub async fn run_background(
        &self,
        foreground: &ForegroundOutcome,
        agents: &HashMap<AgentId, Agent>,
        cancel: &CancellationToken,
    ) -> PipelineOutcome {
        let main_errors = self.run_parallel_stage(&foreground.main, agents, &foreground.context, cancel).await;
        for err in &main_errors {
            warn!(agent_id = %err.agent_id, error = %err.message, "main-stage agent failed");
        }

        let mut post_errors = Vec::new();
        for stage_agent in &foreground.post {
            if cancel.is_cancelled() {
                break;
            }
            let Some(agent) = agents.get(&stage_agent.agent_id) else {
                continue;
            };
            if let Err(e) = self.invoke_agent(agent, &foreground.context, cancel).await {
                warn!(agent_id = %agent.id, error = %e, "post-process agent failed");
                post_errors.push(StageError {
                    agent_id: agent.id,
                    message: sanitize_message(&e.to_string()),
                });
            }
        }

        info!(main_errors = main_errors.len(), post_errors = post_errors.len(), "pipeline background stage finished");

        PipelineOutcome { reply: foreground.reply.clone(), main_errors, post_errors }
    }

    /// All-settled parallel fan-out: every future is wrapped to return
    /// `Result` so one agent's failure cannot cancel its siblings.
    async fn run_parallel_stage(&self, stage: &[InboxAgent], agents: &HashMap<AgentId, Agent>, context: &Value, cancel: &CancellationToken) -> Vec<StageError> {
        let futures = stage.iter().filter_map(|stage_agent| {
            let agent = agents.get(&stage_agent.agent_id)?;
            Some(async move {
                match self.invoke_agent(agent, context, cancel).await {
                    Ok(_) => None,
                    Err(e) => Some(StageError {
                        agent_id: agent.id,
                        message: sanitize_message(&e.to_string()),
                    }),
                }
            })
        });

        join_all(futures).await.into_iter().flatten().collect()
    }

    async fn invoke_agent(&self, agent: &Agent, context: &Value, cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let prompt = format!("{}\n\nContext:\n{}", agent.prompt, context);
        let request = LlmRequest {
            prompt,
            temperature: agent.settings.temperature,
            max_tokens: agent.settings.max_tokens,
            connection_id: agent.settings.connection_id.clone(),
            model_id: agent.settings.model_id.clone(),
        };
        tokio::time::timeout(DEFAULT_LLM_DEADLINE, self.llm.complete(request))
            .await
            .map_err(|_| PipelineError::Cancelled)?
    }
}

fn extract_query_text(context: &Value) -> String {
    context
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| context.to_string())
}

fn merge_context(context: &mut Value, agent_id: &AgentId, output: &str) {
    if let Value::Object(map) = context {
        let preprocess = map.entry("preprocess").or_insert_with(|| json!({}));
        if let Some(pre) = preprocess.as_object_mut() {
            pre.insert(agent_id.to_string(), json!(output));
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::stores::MemoryVectorStore;
    use crate::traits::Embedder;
    use crate::types::{AgentSettings, AgentType, InboxId, InboxSettings, ResponseAgentConfig};

    struct EchoLlm;

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn complete(&self, request: LlmRequest) -> Result<String> {
            Ok(format!("echo: {}", request.prompt.len()))
        }
    }

    struct NoopChat;

    #[async_trait]
    impl ChatPlatform for NoopChat {
        async fn deliver_reply(&self, _inbox_id: &str, _event_id: &str, _reply: &str) -> Result<()> {
            Ok(())
        }
    }

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn dimension(&self) -> usize {
            2
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn agent(id: AgentId, agent_type: AgentType) -> Agent {
        Agent {
            id,
            name: "a".into(),
            prompt: "be helpful".into(),
            settings: AgentSettings::default(),
            agent_type,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn pipeline_without_response_agent_runs_main_and_post() {
        let store = Arc::new(MemoryVectorStore::new());
        let retrieval = Arc::new(RetrievalService::new(store, Arc::new(StubEmbedder)));
        let executor = PipelineExecutor::new(retrieval, Arc::new(EchoLlm), Arc::new(NoopChat));

        let main_agent_id = AgentId::new();
        let post_agent_id = AgentId::new();
        let mut agents = HashMap::new();
        agents.insert(main_agent_id, agent(main_agent_id, AgentType::Analytics));
        agents.insert(post_agent_id, agent(post_agent_id, AgentType::PostProcess));

        let inbox = Inbox {
            id: InboxId::new(),
            response_agent: None,
            agents: vec![
                InboxAgent { agent_id: main_agent_id, priority: 100, is_active: true },
                InboxAgent { agent_id: post_agent_id, priority: 200, is_active: true },
            ],
            settings: InboxSettings::default(),
        };

        let event = WebhookEvent { event: "message_created".into(), message: json!({"text": "hi"}) };
        let cancel = CancellationToken::new();
        let foreground = executor.run_foreground(&inbox, &agents, &event, &cancel).await.unwrap();
        let outcome = executor.run_background(&foreground, &agents, &cancel).await;

        assert!(outcome.reply.is_none());
        assert!(outcome.main_errors.is_empty());
        assert!(outcome.post_errors.is_empty());
    }

    #[tokio::test]
    async fn pipeline_with_response_agent_delivers_reply() {
        let store = Arc::new(MemoryVectorStore::new());
        let retrieval = Arc::new(RetrievalService::new(store, Arc::new(StubEmbedder)));
        let executor = PipelineExecutor::new(retrieval, Arc::new(EchoLlm), Arc::new(NoopChat));

        let response_agent_id = AgentId::new();
        let mut agents = HashMap::new();
        agents.insert(response_agent_id, agent(response_agent_id, AgentType::Response));

        let inbox = Inbox {
            id: InboxId::new(),
            response_agent: Some(ResponseAgentConfig { agent_id: response_agent_id, config: AgentSettings::default() }),
            agents: vec![],
            settings: InboxSettings::default(),
        };

        let event = WebhookEvent { event: "message_created".into(), message: json!({"text": "what color is the sky"}) };
        let foreground = executor.run_foreground(&inbox, &agents, &event, &CancellationToken::new()).await.unwrap();

        assert!(foreground.reply.is_some());
    }
}
