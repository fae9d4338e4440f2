//! Chat-completion provider implementations.
//!
//! Each provider implements [`BaseLLM`](crate::llms::base_llm::BaseLLM).

pub mod openai;

pub use openai::OpenAICompletion;
