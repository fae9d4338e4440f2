//! Game event persistence.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::{TableStore, ANALYSIS_TABLE, CHAT_LOGS_TABLE, SESSIONS_TABLE, USERS_TABLE};
use crate::persona::{Gender, Persona};
use crate::types::{
    ChatMessage, NewChatLog, NewGameSession, NewUser, RecordId, SessionAnalysis, SessionOutcome,
};
use crate::utilities::errors::StoreError;

/// Prefix of every user-facing persistence failure message.
pub const SAVE_FAILED_PREFIX: &str = "DB 저장 실패: ";

/// Surfaces a failure message to whoever operates the game.
pub trait ErrorReporter: Send + Sync + fmt::Debug {
    fn report(&self, message: &str);
}

/// Reports through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, message: &str) {
        log::error!("{message}");
    }
}

/// Insert/update operations for users, sessions, chat logs and analyses.
#[derive(Debug, Clone)]
pub struct GameRepository {
    store: Arc<dyn TableStore>,
    reporter: Arc<dyn ErrorReporter>,
}

impl GameRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub async fn register_user(&self, nickname: &str, gender: Gender) -> Option<RecordId> {
        let user = NewUser {
            nickname: nickname.to_string(),
            gender,
            marketing_agree: true,
        };
        self.insert_returning(USERS_TABLE, "user_id", &user).await
    }

    pub async fn create_session(
        &self,
        user_id: RecordId,
        final_choice: Option<String>,
        my_persona: Option<String>,
        ideal_preference: Option<String>,
    ) -> Option<RecordId> {
        let session = NewGameSession {
            user_id,
            final_choice,
            my_persona,
            ideal_preference,
        };
        self.insert_returning(SESSIONS_TABLE, "session_id", &session)
            .await
    }

    /// Record the end-of-game outcome. Returns whether the store accepted it.
    pub async fn update_session(
        &self,
        session_id: &RecordId,
        final_choice: &str,
        my_persona: &str,
        ideal_preference: &str,
    ) -> bool {
        let outcome = SessionOutcome {
            final_choice: final_choice.to_string(),
            my_persona: my_persona.to_string(),
            ideal_preference: ideal_preference.to_string(),
        };
        let result = async {
            let patch = serde_json::to_value(&outcome)
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            self.store
                .update_eq(SESSIONS_TABLE, "session_id", session_id.as_value(), patch)
                .await
        }
        .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Persist one round's transcript without its system entries.
    pub async fn save_chat_log(
        &self,
        session_id: RecordId,
        partner_type: Persona,
        history: &[ChatMessage],
        turn_count: u32,
    ) -> Option<RecordId> {
        let log = NewChatLog::new(session_id, partner_type, history, turn_count);
        self.insert_returning(CHAT_LOGS_TABLE, "log_id", &log).await
    }

    pub async fn save_analysis(
        &self,
        session_id: RecordId,
        analysis: &SessionAnalysis,
    ) -> Option<RecordId> {
        let row = analysis.to_row(session_id);
        self.insert_returning(ANALYSIS_TABLE, "analysis_id", &row)
            .await
    }

    async fn insert_returning<T: Serialize>(
        &self,
        table: &str,
        id_column: &str,
        row: &T,
    ) -> Option<RecordId> {
        let result = async {
            let row = serde_json::to_value(row).map_err(|e| StoreError::Decode(e.to_string()))?;
            let rows = self.store.insert(table, row).await?;
            rows.first()
                .and_then(|r| r.get(id_column))
                .cloned()
                .and_then(RecordId::from_value)
                .ok_or_else(|| {
                    StoreError::Decode(format!("no {id_column} in {table} insert response"))
                })
        }
        .await;

        match result {
            Ok(id) => {
                log::debug!("Inserted {table} row {id}");
                Some(id)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    fn fail(&self, error: &StoreError) {
        self.reporter.report(&format!("{SAVE_FAILED_PREFIX}{error}"));
    }
}
