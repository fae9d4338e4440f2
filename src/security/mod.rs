//! Player input filtering.

pub mod constants;
pub mod sanitizer;

pub use sanitizer::{DenylistSanitizer, InputSanitizer, RejectionKind, SanitizeVerdict};
