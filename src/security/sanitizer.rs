//! Prompt-injection filtering for player input.
//!
//! [`DenylistSanitizer`] is a heuristic: it rejects inputs that contain
//! known control tokens, override phrases, or JSON payloads aimed at the
//! reply format. It is best-effort and easy to evade; swap in a stricter
//! [`InputSanitizer`] where that matters.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::{
    BRACE_THRESHOLD, COLLAPSE_RUN, COLLAPSIBLE_CHARS, CONTROL_TOKENS, JSON_KEY_MARKERS,
    MAX_INPUT_CHARS, OVERRIDE_PHRASES, SUSPICIOUS_JSON_KEYS,
};

static CONTROL_TOKENS_LOWER: Lazy<Vec<String>> = Lazy::new(|| lowercase_all(CONTROL_TOKENS));
static OVERRIDE_PHRASES_LOWER: Lazy<Vec<String>> = Lazy::new(|| lowercase_all(OVERRIDE_PHRASES));
static JSON_KEY_MARKERS_LOWER: Lazy<Vec<String>> = Lazy::new(|| lowercase_all(JSON_KEY_MARKERS));

fn lowercase_all(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Which rule rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    ControlToken,
    OverridePhrase,
    JsonKeyMarker,
    JsonStructure,
    TooLong,
}

/// Outcome of sanitizing one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeVerdict {
    pub safe: bool,
    /// Text to forward when safe; empty when rejected.
    pub cleaned: String,
    /// Player-facing explanation; empty when safe.
    pub warning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionKind>,
}

impl SanitizeVerdict {
    pub fn accept(cleaned: impl Into<String>) -> Self {
        Self {
            safe: true,
            cleaned: cleaned.into(),
            warning: String::new(),
            rejection: None,
        }
    }

    pub fn reject(kind: RejectionKind, warning: impl Into<String>) -> Self {
        Self {
            safe: false,
            cleaned: String::new(),
            warning: warning.into(),
            rejection: Some(kind),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy trait
// ---------------------------------------------------------------------------

/// Input filtering policy applied to the latest player message.
pub trait InputSanitizer: Send + Sync + fmt::Debug {
    fn sanitize(&self, text: &str) -> SanitizeVerdict;
}

/// Default policy. Rules run in order and the first match wins:
///
/// 1. empty input passes unchanged
/// 2. model control tokens
/// 3. instruction-override phrases
/// 4. quoted JSON key markers
/// 5. brace-heavy text that parses as JSON containing a suspicious key
/// 6. more than [`MAX_INPUT_CHARS`] characters
/// 7. otherwise safe, with bracket runs collapsed
#[derive(Debug, Clone, Copy, Default)]
pub struct DenylistSanitizer;

impl DenylistSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl InputSanitizer for DenylistSanitizer {
    fn sanitize(&self, text: &str) -> SanitizeVerdict {
        if text.is_empty() {
            return SanitizeVerdict::accept(text);
        }

        let lower = text.to_lowercase();

        if let Some(i) = first_match(&lower, &CONTROL_TOKENS_LOWER) {
            return SanitizeVerdict::reject(
                RejectionKind::ControlToken,
                format!("⚠️ 특수 토큰이 감지되었습니다: {}", CONTROL_TOKENS[i]),
            );
        }

        if let Some(i) = first_match(&lower, &OVERRIDE_PHRASES_LOWER) {
            return SanitizeVerdict::reject(
                RejectionKind::OverridePhrase,
                format!("⚠️ 허용되지 않는 명령어가 감지되었습니다: {}", OVERRIDE_PHRASES[i]),
            );
        }

        if first_match(&lower, &JSON_KEY_MARKERS_LOWER).is_some() {
            return SanitizeVerdict::reject(
                RejectionKind::JsonKeyMarker,
                "⚠️ JSON 인젝션 시도가 감지되었습니다",
            );
        }

        // TODO: brace-heavy code snippets that happen to parse as JSON with
        // one of these words are rejected too; decide whether chat about code
        // needs an allowance.
        if brace_count(text) >= BRACE_THRESHOLD && parses_to_suspicious_json(text) {
            return SanitizeVerdict::reject(
                RejectionKind::JsonStructure,
                "⚠️ JSON 구조 인젝션이 감지되었습니다",
            );
        }

        if text.chars().count() > MAX_INPUT_CHARS {
            return SanitizeVerdict::reject(
                RejectionKind::TooLong,
                format!("⚠️ 메시지가 너무 깁니다. (최대 {MAX_INPUT_CHARS}자)"),
            );
        }

        SanitizeVerdict::accept(collapse_bracket_runs(text))
    }
}

fn first_match(haystack: &str, needles: &[String]) -> Option<usize> {
    needles.iter().position(|n| haystack.contains(n.as_str()))
}

fn brace_count(text: &str) -> usize {
    text.chars().filter(|c| matches!(c, '{' | '}')).count()
}

/// Unparseable text is benign here.
fn parses_to_suspicious_json(text: &str) -> bool {
    match serde_json::from_str::<Value>(text) {
        Ok(parsed) => {
            let rendered = parsed.to_string().to_lowercase();
            SUSPICIOUS_JSON_KEYS.iter().any(|k| rendered.contains(k))
        }
        Err(_) => false,
    }
}

/// Collapse runs of [`COLLAPSE_RUN`]+ identical bracket-like characters to one.
pub fn collapse_bracket_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if !COLLAPSIBLE_CHARS.contains(&c) {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        let keep = if run >= COLLAPSE_RUN { 1 } else { run };
        out.extend(std::iter::repeat(c).take(keep));
    }

    out
}
