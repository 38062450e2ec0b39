//! In-memory Agent/Inbox registry.
//!
//! Administrative CRUD for agents, inboxes, and connections is named
//! out of scope in the purpose and scope section; this registry is the
//! minimal seam the in-scope pipeline needs to look an agent or inbox up
//! by id. A real deployment wires this against whatever CRUD surface
//! owns that data; tests and the CLI populate it directly.

use std::collections::HashMap;
use std::sync::RwLock;

use ragcore::error::{PipelineError, Result};
use ragcore::types::{Agent, AgentId, Inbox, InboxId};

#[derive(Default)]
pub struct Registry {
    agents: RwLock<HashMap<AgentId, Agent>>,
    inboxes: RwLock<HashMap<InboxId, Inbox>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_agent(&self, agent: Agent) {
        self.agents.write().unwrap().insert(agent.id, agent);
    }

    pub fn get_agent(&self, id: &AgentId) -> Option<Agent> {
        self.agents.read().unwrap().get(id).cloned()
    }

    pub fn all_agents(&self) -> HashMap<AgentId, Agent> {
        self.agents.read().unwrap().clone()
    }

    /// Validates the inbox's configuration invariants (spec.md's
    /// response-agent exclusion and priority-range policy) before it is
    /// written, rejecting violations as `InvalidInput` at write time
    /// rather than at first pipeline run.
    pub fn insert_inbox(&self, inbox: Inbox) -> Result<()> {
        let agent_types = self.agents.read().unwrap().iter().map(|(id, agent)| (*id, agent.agent_type)).collect();
        inbox.validate(&agent_types).map_err(PipelineError::InvalidInput)?;
        self.inboxes.write().unwrap().insert(inbox.id, inbox);
        Ok(())
    }

    pub fn get_inbox(&self, id: &InboxId) -> Option<Inbox> {
        self.inboxes.read().unwrap().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore::types::{AgentSettings, AgentType, InboxAgent, InboxSettings};

    #[test]
    fn round_trips_agents() {
        let registry = Registry::new();
        let id = AgentId::new();
        registry.insert_agent(Agent {
            id,
            name: "a".into(),
            prompt: "p".into(),
            settings: AgentSettings::default(),
            agent_type: AgentType::Response,
            is_active: true,
        });
        assert!(registry.get_agent(&id).is_some());
        assert_eq!(registry.all_agents().len(), 1);
    }

    #[test]
    fn insert_inbox_rejects_response_agent_in_agents_list() {
        let registry = Registry::new();
        let response_id = AgentId::new();
        registry.insert_agent(Agent {
            id: response_id,
            name: "r".into(),
            prompt: "p".into(),
            settings: AgentSettings::default(),
            agent_type: AgentType::Response,
            is_active: true,
        });

        let inbox = Inbox {
            id: InboxId::new(),
            response_agent: None,
            agents: vec![InboxAgent { agent_id: response_id, priority: 100, is_active: true }],
            settings: InboxSettings::default(),
        };

        assert!(matches!(registry.insert_inbox(inbox), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn insert_inbox_rejects_negative_priority() {
        let registry = Registry::new();
        let inbox = Inbox {
            id: InboxId::new(),
            response_agent: None,
            agents: vec![InboxAgent { agent_id: AgentId::new(), priority: -1, is_active: true }],
            settings: InboxSettings::default(),
        };

        assert!(matches!(registry.insert_inbox(inbox), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn insert_inbox_accepts_valid_configuration() {
        let registry = Registry::new();
        let inbox = Inbox {
            id: InboxId::new(),
            response_agent: None,
            agents: vec![InboxAgent { agent_id: AgentId::new(), priority: 100, is_active: true }],
            settings: InboxSettings::default(),
        };

        assert!(registry.insert_inbox(inbox).is_ok());
    }
}
