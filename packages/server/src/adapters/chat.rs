//! Default `ChatPlatform`: logs the reply instead of delivering it
//! anywhere. The origin chat platform is named an external collaborator
//! consumed by a narrow interface; a real deployment swaps this adapter
//! for one that calls out to the actual platform.

use async_trait::async_trait;
use ragcore::error::Result;
use ragcore::traits::ChatPlatform;
use tracing::info;

pub struct LoggingChatPlatform;

#[async_trait]
impl ChatPlatform for LoggingChatPlatform {
    async fn deliver_reply(&self, inbox_id: &str, event_id: &str, reply: &str) -> Result<()> {
        info!(inbox_id, event_id, reply, "delivering reply");
        Ok(())
    }
}
