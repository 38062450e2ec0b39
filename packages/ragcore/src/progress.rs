//! In-process publish/subscribe for long-running jobs, grounded on the
//! teacher's `StreamHub`. Keyed by job id (agent/document pair) rather
//! than an arbitrary string topic; capacity 16 per the concurrency model
//! rather than the teacher's 256, since a single job's progress stream is
//! small and slow consumers should drop rather than backpressure.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::types::CrawlProgress;

pub const CHANNEL_CAPACITY: usize = 16;

#[derive(Default)]
pub struct ProgressBus {
    channels: RwLock<HashMap<String, broadcast::Sender<CrawlProgress>>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish is a no-op if nobody is subscribed to `job_id` — the
    /// producer never blocks on a missing consumer.
    pub async fn publish(&self, job_id: &str, event: CrawlProgress) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(job_id) {
            let _ = tx.send(event);
        }
    }

    /// Subscribe to `job_id`, creating its channel if this is the first
    /// subscriber. Events are dropped from the channel tail, not the
    /// producer side, when a consumer falls behind.
    pub async fn subscribe(&self, job_id: &str) -> broadcast::Receiver<CrawlProgress> {
        let mut channels = self.channels.write().await;
        channels
            .entry(job_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Remove channels with no subscribers left.
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

pub type SharedProgressBus = Arc<ProgressBus>;

/// Adapts a `ProgressBus` channel into the `CrawlSink` the crawler writes
/// progress frames to, so the crawler itself has no transport dependency.
pub struct BusSink {
    bus: SharedProgressBus,
    job_id: String,
}

impl BusSink {
    pub fn new(bus: SharedProgressBus, job_id: impl Into<String>) -> Self {
        Self { bus, job_id: job_id.into() }
    }
}

#[async_trait::async_trait]
impl crate::crawl::CrawlSink for BusSink {
    async fn emit(&self, progress: CrawlProgress) {
        self.bus.publish(&self.job_id, progress).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_subscribe_roundtrip() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe("job-1").await;
        bus.publish("job-1", CrawlProgress::starting("go")).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.message, "go");
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_noop() {
        let bus = ProgressBus::new();
        bus.publish("job-1", CrawlProgress::starting("go")).await;
    }

    #[tokio::test]
    async fn cleanup_removes_channels_with_no_subscribers() {
        let bus = ProgressBus::new();
        {
            let _rx = bus.subscribe("job-1").await;
        }
        bus.cleanup().await;
        assert_eq!(bus.channels.read().await.len(), 0);
    }
}
