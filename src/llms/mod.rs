//! Chat-completion clients.
//!
//! - [`base_llm`] - the [`BaseLLM`] trait the orchestrator depends on
//! - [`providers`] - concrete providers (OpenAI)

pub mod base_llm;
pub mod providers;

pub use base_llm::{BaseLLM, CompletionRequest, ResponseFormat};
pub use providers::OpenAICompletion;
