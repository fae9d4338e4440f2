//! Partner personas and prompt rendering.
//!
//! Pure functions only: the same persona and player gender always render
//! the same prompt, name, and greeting. The partner is always the opposite
//! gender of the player.

pub mod profile;
pub mod prompt;

pub use profile::{first_greeting, persona_display_name, Gender, Persona};
pub use prompt::{analysis_prompt, build_system_prompt};
