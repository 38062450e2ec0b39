//! Orchestration: glues fetch/crawl/extract/chunk/embed/upsert together
//! and assembles ranked retrieval results.

pub mod ingest;
pub mod retrieve;

pub use ingest::{IngestOutcome, IngestSource, Ingestor};
pub use retrieve::{RetrievalResult, RetrievalService};
