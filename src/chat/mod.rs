//! Chat turn handling and session analysis.

pub mod handler;

pub use handler::{render_transcript, ResponseOrchestrator};
