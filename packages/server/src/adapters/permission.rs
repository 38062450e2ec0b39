//! Default `PermissionChecker`: grants every capability to the
//! configured admin actor ids, denies everyone else, generalized from
//! the teacher's admin-only capability model.

use async_trait::async_trait;
use ragcore::error::{PipelineError, Result};
use ragcore::traits::{Capability, PermissionChecker};

pub struct AdminListPermissionChecker {
    admin_actor_ids: Vec<String>,
}

impl AdminListPermissionChecker {
    pub fn new(admin_actor_ids: Vec<String>) -> Self {
        Self { admin_actor_ids }
    }
}

#[async_trait]
impl PermissionChecker for AdminListPermissionChecker {
    async fn check(&self, actor_id: &str, _capability: Capability) -> Result<()> {
        if self.admin_actor_ids.iter().any(|id| id == actor_id) {
            Ok(())
        } else {
            Err(PipelineError::AccessDenied)
        }
    }
}
