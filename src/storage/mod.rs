//! Persistence adapter for the hosted relational store.
//!
//! [`TableStore`] is the transport seam (insert, update-by-equality).
//! [`GameRepository`] maps game events onto it and never propagates an
//! error: failures are reported once and turned into `None`/`false`.

pub mod repository;
pub mod rest;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::utilities::errors::StoreError;

pub use repository::{ErrorReporter, GameRepository, LogReporter};
pub use rest::RestStore;

pub const USERS_TABLE: &str = "users";
pub const SESSIONS_TABLE: &str = "game_sessions";
pub const CHAT_LOGS_TABLE: &str = "chat_logs";
pub const ANALYSIS_TABLE: &str = "analysis_results";

/// Minimal row-level access to named tables.
#[async_trait]
pub trait TableStore: Send + Sync + fmt::Debug {
    /// Insert one row and return the stored representation.
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError>;

    /// Apply `patch` to every row where `column` equals `value`.
    async fn update_eq(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;
}
