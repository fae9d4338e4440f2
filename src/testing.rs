//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llms::base_llm::{BaseLLM, CompletionRequest, ResponseFormat};
use crate::rag::ContextRetriever;
use crate::storage::{ErrorReporter, TableStore};
use crate::types::ChatMessage;
use crate::utilities::errors::{LlmError, StoreError};

// ---------------------------------------------------------------------------
// Completion endpoint
// ---------------------------------------------------------------------------

/// One recorded completion call.
#[derive(Debug, Clone)]
pub struct SeenCompletion {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
}

/// Completion double that answers with a fixed body or a fixed failure.
#[derive(Debug)]
pub struct MockLLM {
    reply: Result<String, u16>,
    calls: AtomicUsize,
    seen: Mutex<Vec<SeenCompletion>>,
}

impl MockLLM {
    pub fn replying(body: impl Into<String>) -> Self {
        Self {
            reply: Ok(body.into()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an API error carrying `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenCompletion> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseLLM for MockLLM {
    fn provider(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(SeenCompletion {
            model: request.model.to_string(),
            messages: request.messages.to_vec(),
            response_format: request.response_format,
        });
        match &self.reply {
            Ok(body) => Ok(body.clone()),
            Err(status) => Err(LlmError::Api {
                status: *status,
                body: "provider exploded".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Retrieval helper
// ---------------------------------------------------------------------------

/// Retriever returning fixed context, or failing when `None`.
#[derive(Debug)]
pub struct StaticRetriever {
    pub context: Option<String>,
    pub queries: Mutex<Vec<String>>,
}

impl StaticRetriever {
    pub fn new(context: Option<&str>) -> Self {
        Self {
            context: context.map(str::to_string),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContextRetriever for StaticRetriever {
    async fn search_context(&self, query: &str) -> Result<String, anyhow::Error> {
        self.queries.lock().unwrap().push(query.to_string());
        self.context
            .clone()
            .ok_or_else(|| anyhow::anyhow!("index unavailable"))
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// One recorded store call.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Insert {
        table: String,
        row: Value,
    },
    Update {
        table: String,
        column: String,
        value: Value,
        patch: Value,
    },
}

/// In-memory store that assigns sequential ids per table and records calls.
#[derive(Debug, Default)]
pub struct MockStore {
    pub calls: Mutex<Vec<StoreCall>>,
    next_id: AtomicUsize,
    /// Tables whose requests fail.
    pub failing_tables: Vec<String>,
    /// Insert responses come back empty for these tables.
    pub empty_tables: Vec<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(100),
            ..Self::default()
        }
    }

    pub fn failing_on(table: &str) -> Self {
        Self {
            failing_tables: vec![table.to_string()],
            ..Self::new()
        }
    }

    /// Inserts into these tables succeed but return no rows.
    pub fn with_empty_tables(tables: &[&str]) -> Self {
        Self {
            empty_tables: tables.iter().map(|t| t.to_string()).collect(),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, table: &str) -> Result<(), StoreError> {
        if self.failing_tables.iter().any(|t| t == table) {
            return Err(StoreError::Api {
                status: 409,
                body: format!("violates foreign key constraint on {table}"),
            });
        }
        Ok(())
    }
}

fn id_column(table: &str) -> &'static str {
    match table {
        "users" => "user_id",
        "game_sessions" => "session_id",
        "chat_logs" => "log_id",
        "analysis_results" => "analysis_id",
        _ => "id",
    }
}

#[async_trait]
impl TableStore for MockStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Insert {
            table: table.to_string(),
            row: row.clone(),
        });
        self.check(table)?;
        if self.empty_tables.iter().any(|t| t == table) {
            return Ok(Vec::new());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = row;
        stored[id_column(table)] = Value::from(id);
        Ok(vec![stored])
    }

    async fn update_eq(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Update {
            table: table.to_string(),
            column: column.to_string(),
            value: value.clone(),
            patch: patch.clone(),
        });
        self.check(table)?;
        Ok(vec![patch])
    }
}

/// Reporter that keeps every message.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
