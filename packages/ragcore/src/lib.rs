//! Context ingestion and retrieval pipeline for multi-tenant support
//! agents: fetch/crawl a source, extract and chunk its text, embed and
//! upsert into a per-agent vector collection, then retrieve and route
//! through an inbox's pipeline of agents.

pub mod chunk;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod inbox;
pub mod pipeline;
pub mod progress;
pub mod sanitize;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{PipelineError, Result};
