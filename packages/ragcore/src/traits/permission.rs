//! Permission checker interface, generalized from the teacher's admin-only
//! capability model (`Actor::new(id).can(capability).check(deps)`) into a
//! small capability enum covering agent, inbox, and context-document
//! mutation and read actions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    ReadAgent,
    ManageAgent,
    ReadContextDocument,
    ManageContextDocument,
    ManageInbox,
    TriggerSearch,
}

#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check(&self, actor_id: &str, capability: Capability) -> Result<()>;
}

/// Fluent entry point mirroring the teacher's `Actor::new(id).can(cap)`
/// builder, wired against a `PermissionChecker` instead of a fixed
/// admin-identifier list.
pub struct Actor<'a> {
    actor_id: &'a str,
}

impl<'a> Actor<'a> {
    pub fn new(actor_id: &'a str) -> Self {
        Self { actor_id }
    }

    pub fn can(self, capability: Capability) -> CapabilityCheck<'a> {
        CapabilityCheck {
            actor_id: self.actor_id,
            capability,
        }
    }
}

pub struct CapabilityCheck<'a> {
    actor_id: &'a str,
    capability: Capability,
}

impl<'a> CapabilityCheck<'a> {
    pub async fn check(self, checker: &dyn PermissionChecker) -> Result<()> {
        checker
            .check(self.actor_id, self.capability)
            .await
            .map_err(|_| PipelineError::AccessDenied)
    }
}
