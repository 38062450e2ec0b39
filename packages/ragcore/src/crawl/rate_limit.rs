//! Per-host politeness: a token bucket (default 2 rps) plus a concurrency
//! semaphore (default 4 in-flight fetches), grounded on the teacher's
//! `RateLimitedCrawler` but keyed per-host instead of applied globally.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{Quota, RateLimiter};
use tokio::sync::{Mutex, Semaphore};

pub const DEFAULT_HOST_RPS: u32 = 2;
pub const DEFAULT_HOST_CONCURRENCY: usize = 4;

type HostRateLimiter = RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

struct HostLimiter {
    rate: Arc<HostRateLimiter>,
    concurrency: Arc<Semaphore>,
}

/// Bounds in-flight fetches per host and enforces a per-host token bucket,
/// matching the "no global locks, per-host politeness" policy in the
/// concurrency model.
pub struct HostLimiters {
    rps: u32,
    concurrency: usize,
    hosts: Mutex<HashMap<String, Arc<HostLimiter>>>,
}

impl HostLimiters {
    pub fn new(rps: u32, concurrency: usize) -> Self {
        Self {
            rps,
            concurrency,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for(&self, host: &str) -> Arc<HostLimiter> {
        let mut hosts = self.hosts.lock().await;
        hosts
            .entry(host.to_string())
            .or_insert_with(|| {
                let quota = Quota::per_second(NonZeroU32::new(self.rps.max(1)).unwrap());
                Arc::new(HostLimiter {
                    rate: Arc::new(RateLimiter::direct(quota)),
                    concurrency: Arc::new(Semaphore::new(self.concurrency.max(1))),
                })
            })
            .clone()
    }

    /// Acquire a permit for `host`, blocking on the rate limiter and the
    /// concurrency semaphore. The returned guard releases the concurrency
    /// slot on drop.
    pub async fn acquire(&self, host: &str) -> tokio::sync::OwnedSemaphorePermit {
        let limiter = self.limiter_for(host).await;
        limiter.rate.until_ready().await;
        limiter.concurrency.clone().acquire_owned().await.expect("semaphore closed")
    }
}

impl Default for HostLimiters {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_RPS, DEFAULT_HOST_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_returns_distinct_permits_per_host() {
        let limiters = HostLimiters::new(100, 2);
        let a = limiters.acquire("a.example.com").await;
        let b = limiters.acquire("b.example.com").await;
        drop(a);
        drop(b);
    }

    #[tokio::test]
    async fn concurrency_is_capped_per_host() {
        let limiters = Arc::new(HostLimiters::new(1000, 1));
        let _first = limiters.acquire("example.com").await;
        let second = tokio::time::timeout(std::time::Duration::from_millis(50), limiters.acquire("example.com")).await;
        assert!(second.is_err(), "second acquire should block while the first permit is held");
    }
}
