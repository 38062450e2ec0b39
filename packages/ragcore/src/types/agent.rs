//! Agent: a unit of personality plus ingested knowledge.

use serde::{Deserialize, Serialize};

use super::ids::AgentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    Response,
    PreProcess,
    Analytics,
    Moderation,
    Routing,
    PostProcess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_delay_sec: u32,
    pub connection_id: Option<String>,
    pub model_id: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
            response_delay_sec: 0,
            connection_id: None,
            model_id: None,
        }
    }
}

impl AgentSettings {
    /// Validate the bounds named in the data model: temperature in [0,1],
    /// maxTokens in [1,2000], responseDelaySec in [0,30].
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err("temperature must be within [0, 1]".into());
        }
        if !(1..=2000).contains(&self.max_tokens) {
            return Err("maxTokens must be within [1, 2000]".into());
        }
        if self.response_delay_sec > 30 {
            return Err("responseDelaySec must be within [0, 30]".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub prompt: String,
    pub settings: AgentSettings,
    pub agent_type: AgentType,
    pub is_active: bool,
}

impl Agent {
    /// The deterministic name of this agent's vector collection.
    pub fn collection_name(&self) -> String {
        collection_name(&self.id)
    }
}

pub fn collection_name(agent_id: &AgentId) -> String {
    format!("agent_{}", agent_id)
}
