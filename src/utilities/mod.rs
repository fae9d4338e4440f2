//! Settings and error types.

pub mod config;
pub mod errors;
