//! Origin chat platform adapter: delivers a reply back out.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Deliver a reply for the given inbox/event. Delivery is
    /// best-effort; the system makes no exactly-once guarantee.
    async fn deliver_reply(&self, inbox_id: &str, event_id: &str, reply: &str) -> Result<()>;
}
