//! Inbox configuration and the webhook event that drives the pipeline
//! executor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::agent::AgentSettings;
use super::ids::{AgentId, InboxId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAgentConfig {
    pub agent_id: AgentId,
    pub config: AgentSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxAgent {
    pub agent_id: AgentId,
    pub priority: i32,
    pub is_active: bool,
}

/// Priority ranges adopted as policy (§9 Open Questions): pre-process
/// below 100, main in [100, 200), post-process at or above 200.
pub const PRE_PROCESS_CEILING: i32 = 100;
pub const MAIN_CEILING: i32 = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboxSettings {
    #[serde(default)]
    pub extra: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub id: InboxId,
    pub response_agent: Option<ResponseAgentConfig>,
    pub agents: Vec<InboxAgent>,
    pub settings: InboxSettings,
}

impl Inbox {
    /// Enforces the hard invariant that response agents never appear in
    /// the `agents` list, and that priority assignments obey the
    /// pre/main/post policy ranges. Violations are `InvalidInput` at
    /// configuration write time, per the Open Question resolution.
    pub fn validate(&self, agent_types: &std::collections::HashMap<AgentId, super::agent::AgentType>) -> Result<(), String> {
        use super::agent::AgentType;

        if let Some(resp) = &self.response_agent {
            if self.agents.iter().any(|a| a.agent_id == resp.agent_id) {
                return Err("response agent must not appear in agents[]".into());
            }
        }
        for a in &self.agents {
            if let Some(AgentType::Response) = agent_types.get(&a.agent_id) {
                return Err(format!("agent {} is type=response and cannot appear in agents[]", a.agent_id));
            }
        }
        for a in &self.agents {
            if a.priority < 0 {
                return Err(format!("agent {} has negative priority {}", a.agent_id, a.priority));
            }
        }
        Ok(())
    }

    pub fn pre_process_agents(&self) -> Vec<&InboxAgent> {
        self.agents
            .iter()
            .filter(|a| a.is_active && a.priority < PRE_PROCESS_CEILING)
            .collect()
    }

    pub fn main_agents(&self) -> Vec<&InboxAgent> {
        self.agents
            .iter()
            .filter(|a| a.is_active && a.priority >= PRE_PROCESS_CEILING && a.priority < MAIN_CEILING)
            .collect()
    }

    pub fn post_process_agents(&self) -> Vec<&InboxAgent> {
        self.agents
            .iter()
            .filter(|a| a.is_active && a.priority >= MAIN_CEILING)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub message: Value,
}
