//! Response orchestration for chat turns and session analysis.
//!
//! Per turn:
//! 1. Sanitize the latest player message
//! 2. Short-circuit rejected input with an in-character taunt
//! 3. Substitute the cleaned text into a private copy of the transcript
//! 4. Enrich the system prompt with retrieved context, if any
//! 5. One JSON-mode completion call
//! 6. Parse the reply; any failure becomes an error payload
//!
//! Nothing here retries, and no error escapes: callers always get a
//! [`ChatReply`] or an [`AnalysisOutcome`].

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::llms::base_llm::{BaseLLM, CompletionRequest};
use crate::persona::analysis_prompt;
use crate::rag::{enrich_messages, ContextRetriever};
use crate::security::{DenylistSanitizer, InputSanitizer};
use crate::types::{AnalysisOutcome, ChatMessage, ChatReply, Role, RoundRecord, SessionAnalysis};
use crate::utilities::config::{DEFAULT_ANALYSIS_MODEL, DEFAULT_CHAT_MODEL};
use crate::utilities::errors::LlmError;

// ============================================================================
// Fixed payloads
// ============================================================================

/// Reply to input the sanitizer rejected.
pub const TAUNT_RESPONSE: &str = "죄송하지만 기술적인 공격이네요. 안통한다 애송이!";
pub const TAUNT_REASON: &str = "기술적인 공격";
pub const TAUNT_SCORE: i64 = -100;

/// Prefix of the reply text when the completion call fails.
pub const ERROR_RESPONSE_PREFIX: &str = "🚨 오류 발생: ";
/// Prefix of the analysis error when the completion call fails.
pub const ANALYSIS_ERROR_PREFIX: &str = "분석 실패: ";

/// Reply when no completion client is configured.
pub const NOT_CONFIGURED_RESPONSE: &str = "🚨 API Key가 설정되지 않았습니다.";
/// Analysis error when no completion client is configured.
pub const NOT_CONFIGURED_ERROR: &str = "API Key가 설정되지 않았습니다.";

// ============================================================================
// Orchestrator
// ============================================================================

/// Turns transcripts into partner replies and sessions into reports.
///
/// All collaborators are injected. Without a completion client the
/// orchestrator runs degraded and answers every call with a fixed
/// "not configured" payload.
#[derive(Debug, Clone)]
pub struct ResponseOrchestrator {
    llm: Option<Arc<dyn BaseLLM>>,
    sanitizer: Arc<dyn InputSanitizer>,
    retriever: Option<Arc<dyn ContextRetriever>>,
    chat_model: String,
    analysis_model: String,
}

impl ResponseOrchestrator {
    pub fn new(llm: Option<Arc<dyn BaseLLM>>) -> Self {
        Self {
            llm,
            sanitizer: Arc::new(DenylistSanitizer::new()),
            retriever: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn InputSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_retriever(mut self, retriever: Option<Arc<dyn ContextRetriever>>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_models(
        mut self,
        chat_model: impl Into<String>,
        analysis_model: impl Into<String>,
    ) -> Self {
        self.chat_model = chat_model.into();
        self.analysis_model = analysis_model.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Produce the partner's reply to the latest player message.
    pub async fn get_reply(&self, conversation: &[ChatMessage]) -> ChatReply {
        let Some(llm) = self.llm.as_ref() else {
            return ChatReply::new(NOT_CONFIGURED_RESPONSE, 0);
        };

        let mut messages = conversation.to_vec();
        let latest_user = conversation.iter().rposition(|m| m.role == Role::User);

        // ── Steps 1-3: sanitize, short-circuit, substitute ──────────────
        if let Some(idx) = latest_user {
            let original = &conversation[idx].content;
            let verdict = self.sanitizer.sanitize(original);
            if !verdict.safe {
                log::warn!(
                    "Rejected player input ({:?}): {}",
                    verdict.rejection,
                    verdict.warning
                );
                return ChatReply::new(TAUNT_RESPONSE, TAUNT_SCORE).with_reason(TAUNT_REASON);
            }
            if verdict.cleaned != *original {
                log::debug!("Player input normalized before completion");
                messages[idx].content = verdict.cleaned;
            }
        }

        // ── Step 4: enrichment ──────────────────────────────────────────
        let query = latest_user
            .map(|idx| messages[idx].content.clone())
            .filter(|text| !text.is_empty());
        let messages = match (self.retriever.as_ref(), query) {
            (Some(retriever), Some(query)) => {
                match retriever.search_context(&query).await {
                    Ok(context) => enrich_messages(&messages, &context),
                    Err(e) => {
                        log::warn!("Context retrieval failed, continuing without it: {e:#}");
                        messages
                    }
                }
            }
            _ => messages,
        };

        // ── Steps 5-6: completion and parse ─────────────────────────────
        match request_json::<ChatReply>(llm.as_ref(), &self.chat_model, &messages).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("Chat completion via {} failed: {e}", llm.provider());
                ChatReply::new(format!("{ERROR_RESPONSE_PREFIX}{e}"), 0)
            }
        }
    }

    /// Summarize every round of a session into a compatibility report.
    pub async fn analyze_session(&self, rounds: &[RoundRecord]) -> AnalysisOutcome {
        let Some(llm) = self.llm.as_ref() else {
            return AnalysisOutcome::Failed {
                error: NOT_CONFIGURED_ERROR.to_string(),
            };
        };

        let messages = vec![
            ChatMessage::system(analysis_prompt()),
            ChatMessage::user(format!(
                "다음 대화 기록을 분석해줘:\n{}",
                render_transcript(rounds)
            )),
        ];

        match request_json::<SessionAnalysis>(llm.as_ref(), &self.analysis_model, &messages).await
        {
            Ok(analysis) => AnalysisOutcome::Completed(analysis),
            Err(e) => {
                log::error!("Session analysis via {} failed: {e}", llm.provider());
                AnalysisOutcome::Failed {
                    error: format!("{ANALYSIS_ERROR_PREFIX}{e}"),
                }
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn request_json<T: DeserializeOwned>(
    llm: &dyn BaseLLM,
    model: &str,
    messages: &[ChatMessage],
) -> Result<T, LlmError> {
    let content = llm.complete(CompletionRequest::json(model, messages)).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Render all rounds as one role-tagged text block. System entries are
/// left out.
pub fn render_transcript(rounds: &[RoundRecord]) -> String {
    let mut text = String::new();
    for round in rounds {
        let number = round
            .round
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        let persona = round.persona.map(|p| p.code()).unwrap_or("UNKNOWN");
        let score = round
            .final_score
            .map(format_score)
            .unwrap_or_else(|| "N/A".to_string());

        text.push_str(&format!(
            "\n\n### 라운드 {number}: {persona} 타입 (최종 호감도: {score})\n"
        ));
        for msg in &round.messages {
            match msg.role {
                Role::User => text.push_str(&format!("[USER]: {}\n", msg.content)),
                Role::Assistant => text.push_str(&format!("[AI]: {}\n", msg.content)),
                Role::System => {}
            }
        }
    }
    text
}

/// Whole numbers render without a fractional part.
fn format_score(score: f64) -> String {
    if score.is_finite() && score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        score.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
