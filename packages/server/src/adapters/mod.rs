//! Concrete adapters for the collaborator interfaces `ragcore` is
//! dependency-injected against.

pub mod chat;
pub mod openai;
pub mod permission;
