//! HTTP server exposing the game backend.
//!
//! A UI drives a play-through through these endpoints: seed a round, relay
//! each turn, then persist the session and its analysis.

pub mod routes;

pub use routes::{app_router, AppState};
