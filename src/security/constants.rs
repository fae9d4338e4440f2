//! Denylists used by [`super::sanitizer::DenylistSanitizer`].
//!
//! All entries are matched case-insensitively as substrings.

/// Chat-template control tokens of common open models.
pub const CONTROL_TOKENS: &[&str] = &[
    "<|begin_of_text|>",
    "<|end_of_text|>",
    "<|start_header_id|>",
    "<|end_header_id|>",
    "<|eot_id|>",
    "[INST]",
    "[/INST]",
    "<<SYS>>",
    "<</SYS>>",
    "<s>",
    "</s>",
];

/// Phrases that try to override the persona instructions (English and Korean).
pub const OVERRIDE_PHRASES: &[&str] = &[
    "ignore previous",
    "ignore all previous",
    "disregard previous",
    "forget previous",
    "new instructions",
    "system prompt",
    "you are now",
    "pretend you are",
    "act as",
    "roleplay as",
    "너는 이제",
    "시스템 프롬프트",
    "이전 지시",
    "무시하고",
];

/// Quoted keys of the reply payload or of a prompt document.
pub const JSON_KEY_MARKERS: &[&str] = &[
    "\"request\":",
    "\"system\":",
    "\"instruction\":",
    "\"instructions\":",
    "\"response\":",
    "\"score\":",
    "\"reason\":",
];

/// Keys that make a parsed JSON document suspicious.
pub const SUSPICIOUS_JSON_KEYS: &[&str] =
    &["request", "system", "instruction", "response", "score", "reason"];

/// Brace count (`{` plus `}`) at which the text is parsed as JSON.
pub const BRACE_THRESHOLD: usize = 4;

/// Longest accepted message, in characters.
pub const MAX_INPUT_CHARS: usize = 1000;

/// Characters whose runs of three or more get collapsed.
pub const COLLAPSIBLE_CHARS: &[char] = &['<', '>', '|', '{', '}', '[', ']'];

/// Shortest run that gets collapsed.
pub const COLLAPSE_RUN: usize = 3;
