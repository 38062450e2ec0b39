//! Data model shared across the pipeline.

pub mod agent;
pub mod chunk;
pub mod config;
pub mod document;
pub mod ids;
pub mod progress;
pub mod webhook;

pub use agent::{Agent, AgentSettings, AgentType};
pub use chunk::{Chunk, ChunkPayload};
pub use config::{ChunkerConfig, CrawlOptions};
pub use document::{ContextDocument, DocumentMetadata, DocumentType, RagStatus, WebsiteMetadata};
pub use ids::{AgentId, ContextDocumentId, InboxId};
pub use progress::{CrawlPhase, CrawlProgress};
pub use webhook::{Inbox, InboxAgent, InboxSettings, ResponseAgentConfig, WebhookEvent, MAIN_CEILING, PRE_PROCESS_CEILING};
