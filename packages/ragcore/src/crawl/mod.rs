//! Bounded same-origin BFS crawler: depth/page/pattern/robots/budget
//! enforcement, with live progress events.

mod bfs;
mod rate_limit;
pub mod robots;

pub use bfs::{CrawlOutcome, CrawlSink, Crawler, CrawledPage, NoopSink};
pub use rate_limit::HostLimiters;
pub use robots::RobotsCache;
