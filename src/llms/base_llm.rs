//! Chat-completion client seam.
//!
//! The orchestrator only ever needs one kind of call: send a transcript,
//! get back the text of a JSON object. Providers implement [`BaseLLM`];
//! tests implement it with counting doubles.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::ChatMessage;
use crate::utilities::errors::LlmError;

/// Output format requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    /// Provider-enforced JSON object output.
    JsonObject,
}

/// A single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub response_format: ResponseFormat,
}

impl<'a> CompletionRequest<'a> {
    /// Request in forced JSON-object mode.
    pub fn json(model: &'a str, messages: &'a [ChatMessage]) -> Self {
        Self {
            model,
            messages,
            response_format: ResponseFormat::JsonObject,
        }
    }
}

/// A chat-completion endpoint.
///
/// One call is one round-trip: implementations must not retry.
#[async_trait]
pub trait BaseLLM: Send + Sync + fmt::Debug {
    /// Provider name, for logs.
    fn provider(&self) -> &str;

    /// Run the completion and return the raw message content.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_format_wire_shape() {
        assert_eq!(
            serde_json::to_value(ResponseFormat::JsonObject).unwrap(),
            serde_json::json!({"type": "json_object"})
        );
        assert_eq!(
            serde_json::to_value(ResponseFormat::Text).unwrap(),
            serde_json::json!({"type": "text"})
        );
    }
}
