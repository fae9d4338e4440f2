//! Retrieval seam and prompt enrichment.

use std::fmt;

use async_trait::async_trait;

use crate::types::{ChatMessage, Role};

/// Header placed before retrieved context in the system prompt.
pub const CONTEXT_HEADER: &str = "[참고 가능한 과거 대화 데이터]";
/// Instruction appended after retrieved context.
pub const CONTEXT_SUFFIX: &str =
    "위 데이터를 참고하되, 현재 대화 흐름에 맞게 자연스럽게 반응해.";

/// Supplies auxiliary text for a query. An empty string means "nothing
/// relevant".
#[async_trait]
pub trait ContextRetriever: Send + Sync + fmt::Debug {
    async fn search_context(&self, query: &str) -> Result<String, anyhow::Error>;
}

/// Return a copy of `messages` with `context` appended to the first system
/// entry. Empty context, or no system entry, yields an unchanged copy.
pub fn enrich_messages(messages: &[ChatMessage], context: &str) -> Vec<ChatMessage> {
    let mut enriched = messages.to_vec();
    if context.trim().is_empty() {
        return enriched;
    }

    if let Some(system) = enriched.iter_mut().find(|m| m.role == Role::System) {
        system.content = format!(
            "{}\n\n{CONTEXT_HEADER}\n{context}\n\n{CONTEXT_SUFFIX}",
            system.content
        );
    }
    enriched
}
