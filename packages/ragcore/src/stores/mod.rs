//! VectorStore and DocumentStore implementations.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{MemoryDocumentStore, MemoryVectorStore};

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
