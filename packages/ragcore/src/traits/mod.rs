//! Interfaces to collaborators named out of scope in the purpose and
//! scope section: the LLM provider, the embedder, the vector store, the
//! permission checker, and the origin chat platform. The pipeline is
//! written entirely against these traits.

pub mod chat;
pub mod document_store;
pub mod embedder;
pub mod llm;
pub mod permission;
pub mod vector_store;

pub use chat::ChatPlatform;
pub use document_store::DocumentStore;
pub use embedder::Embedder;
pub use llm::{LlmClient, LlmRequest};
pub use permission::{Actor, Capability, PermissionChecker};
pub use vector_store::{CollectionInfo, ScoredChunk, VectorStore};
