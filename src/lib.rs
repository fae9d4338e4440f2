//! # blind-date
//!
//! Backend for a conversational blind-date game. A player chats with AI
//! partners of three personas (emotional, logical, tough), each reply
//! carries a likability delta, and the finished session is analyzed into a
//! compatibility report.
//!
//! - [`persona`] renders partner prompts, names and greetings
//! - [`security`] filters player input before it reaches the model
//! - [`chat`] orchestrates replies and session analysis
//! - [`rag`] optionally enriches prompts with past-conversation snippets
//! - [`storage`] persists users, sessions, chat logs and analyses
//! - [`server`] exposes all of it over HTTP

pub mod chat;
pub mod llms;
pub mod persona;
pub mod rag;
pub mod security;
pub mod server;
pub mod storage;
pub mod types;
pub mod utilities;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::ResponseOrchestrator;
pub use llms::base_llm::BaseLLM;
pub use persona::{Gender, Persona};
pub use security::{DenylistSanitizer, InputSanitizer};
pub use storage::{GameRepository, TableStore};
pub use types::{AnalysisOutcome, ChatMessage, ChatReply, RecordId};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
