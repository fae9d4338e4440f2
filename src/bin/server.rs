//! blind-date HTTP server binary.
//!
//! Starts an axum HTTP server that a UI drives through a play-through:
//! persona selection, chat turns, session persistence and analysis.
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL`, `SUPABASE_KEY`: hosted store (required)
//! - `OPENAI_API_KEY`: completion endpoint key; replies degrade without it
//! - `OPENAI_BASE_URL`, `CHAT_MODEL`, `ANALYSIS_MODEL`: completion overrides
//! - `RETRIEVAL_CORPUS`: optional YAML corpus for prompt enrichment
//! - `BLIND_DATE_SECRETS`: fallback secrets file (default: secrets.yaml)
//! - `PORT`: HTTP port (default: 8080)
//! - `RUST_LOG`: Tracing filter (default: "info,blind_date=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use std::sync::Arc;

use anyhow::Context;
use blind_date::chat::ResponseOrchestrator;
use blind_date::llms::{BaseLLM, OpenAICompletion};
use blind_date::rag::{ContextRetriever, KeywordRetriever};
use blind_date::server::{app_router, AppState};
use blind_date::storage::{GameRepository, RestStore};
use blind_date::utilities::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {e}");
        }
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,blind_date=debug".into()),
        )
        .init();

    let settings = Settings::load().context("loading settings")?;
    tracing::debug!(?settings, "Settings loaded");

    // Completion client; absent key means degraded replies
    let llm: Option<Arc<dyn BaseLLM>> = match &settings.openai_api_key {
        Some(key) => Some(Arc::new(
            OpenAICompletion::new(key.clone(), settings.openai_base_url.clone(), None)
                .context("building completion client")?,
        )),
        None => None,
    };

    // Optional retrieval corpus
    let retriever: Option<Arc<dyn ContextRetriever>> = match &settings.retrieval_corpus {
        Some(path) => match KeywordRetriever::from_yaml_file(path) {
            Ok(retriever) => {
                tracing::info!("Retrieval corpus loaded: {} records", retriever.len());
                Some(Arc::new(retriever))
            }
            Err(e) => {
                tracing::warn!("Retrieval disabled: {e:#}");
                None
            }
        },
        None => None,
    };

    let orchestrator = ResponseOrchestrator::new(llm)
        .with_retriever(retriever)
        .with_models(settings.chat_model.clone(), settings.analysis_model.clone());
    let store = RestStore::new(&settings.store, None).context("building store client")?;
    let repository = GameRepository::new(Arc::new(store));

    let app = app_router(AppState::new(orchestrator, repository));
    let bind_addr = format!("0.0.0.0:{}", settings.port);

    tracing::info!("blind-date server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET   /health, /personas");
    tracing::info!("  POST  /chat/start, /chat/reply");
    tracing::info!("  POST  /users, /sessions, /sessions/:id/logs, /sessions/:id/analysis");
    tracing::info!("  PATCH /sessions/:id");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
