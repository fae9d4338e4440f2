//! Retrieval helper for prompt enrichment.
//!
//! The orchestrator asks a [`ContextRetriever`] for text related to the
//! player's latest message and, if there is any, appends it to the system
//! prompt. A retriever that fails to load is simply not installed.

pub mod core;
pub mod keyword;
pub mod types;

pub use self::core::{enrich_messages, ContextRetriever, CONTEXT_HEADER, CONTEXT_SUFFIX};
pub use keyword::KeywordRetriever;
pub use types::{CorpusRecord, SearchResult};
