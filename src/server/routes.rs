//! Axum route handlers for the blind-date game server.
//!
//! # Routes
//!
//! - `GET   /health`                         liveness probe
//! - `GET   /personas?gender=M`              the three partners for a player
//! - `POST  /chat/start`                     seed a round's transcript
//! - `POST  /chat/reply`                     partner reply for a transcript
//! - `POST  /users`                          register a player
//! - `POST  /sessions`                       open a game session
//! - `PATCH /sessions/:session_id`           record the final outcome
//! - `POST  /sessions/:session_id/logs`      store one round's chat log
//! - `POST  /sessions/:session_id/analysis`  analyze and store the report

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::chat::ResponseOrchestrator;
use crate::persona::{build_system_prompt, first_greeting, persona_display_name, Gender, Persona};
use crate::storage::GameRepository;
use crate::types::{AnalysisOutcome, ChatMessage, ChatReply, RecordId, RoundRecord};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ResponseOrchestrator>,
    pub repository: Arc<GameRepository>,
}

impl AppState {
    pub fn new(orchestrator: ResponseOrchestrator, repository: GameRepository) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            repository: Arc::new(repository),
        }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/personas", get(personas_handler))
        .route("/chat/start", post(start_chat_handler))
        .route("/chat/reply", post(reply_handler))
        .route("/users", post(register_user_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/:session_id", patch(update_session_handler))
        .route("/sessions/:session_id/logs", post(save_chat_log_handler))
        .route("/sessions/:session_id/analysis", post(analysis_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn store_unavailable(what: &str) -> ApiError {
    api_error(StatusCode::BAD_GATEWAY, format!("DB 저장 실패: {what}"))
}

fn parse_gender(code: &str) -> Result<Gender, ApiError> {
    Gender::from_code(code).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Unknown gender '{code}', expected M or F"),
        )
    })
}

/// Path ids are numeric when they look numeric, otherwise passed through.
fn path_record_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::from)
        .unwrap_or_else(|_| RecordId::from(raw))
}

// ---------------------------------------------------------------------------
// Personas and chat
// ---------------------------------------------------------------------------

/// GET /health
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "blind-date",
        "llm_configured": state.orchestrator.is_configured(),
    }))
}

#[derive(Debug, Deserialize)]
struct PersonasQuery {
    gender: String,
}

#[derive(Debug, Serialize)]
struct PersonaCard {
    persona: Persona,
    partner_name: String,
    greeting: String,
}

/// GET /personas?gender=M
async fn personas_handler(
    Query(query): Query<PersonasQuery>,
) -> Result<Json<Vec<PersonaCard>>, ApiError> {
    let gender = parse_gender(&query.gender)?;
    Ok(Json(
        Persona::ALL
            .iter()
            .map(|&persona| PersonaCard {
                persona,
                partner_name: persona_display_name(Some(persona), gender),
                greeting: first_greeting(Some(persona), gender),
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct StartChatRequest {
    #[serde(default)]
    persona: Option<String>,
    gender: String,
}

#[derive(Debug, Serialize)]
struct StartChatResponse {
    partner_name: String,
    greeting: String,
    messages: Vec<ChatMessage>,
}

/// POST /chat/start
///
/// An unrecognized persona still starts a round, with the generic prompt
/// and greeting.
async fn start_chat_handler(
    Json(request): Json<StartChatRequest>,
) -> Result<Json<StartChatResponse>, ApiError> {
    let gender = parse_gender(&request.gender)?;
    let persona = request.persona.as_deref().and_then(Persona::from_code);
    if persona.is_none() {
        tracing::warn!(persona = ?request.persona, "Unknown persona, using fallbacks");
    }

    let greeting = first_greeting(persona, gender);
    Ok(Json(StartChatResponse {
        partner_name: persona_display_name(persona, gender),
        messages: vec![
            ChatMessage::system(build_system_prompt(persona, gender)),
            ChatMessage::assistant(greeting.clone()),
        ],
        greeting,
    }))
}

#[derive(Debug, Deserialize)]
struct ReplyRequest {
    messages: Vec<ChatMessage>,
}

/// POST /chat/reply
async fn reply_handler(
    State(state): State<AppState>,
    Json(request): Json<ReplyRequest>,
) -> Json<ChatReply> {
    Json(state.orchestrator.get_reply(&request.messages).await)
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RegisterUserRequest {
    nickname: String,
    gender: Gender,
}

/// POST /users
async fn register_user_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = state
        .repository
        .register_user(&request.nickname, request.gender)
        .await
        .ok_or_else(|| store_unavailable("users"))?;
    Ok(Json(json!({ "user_id": user_id })))
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    user_id: RecordId,
    #[serde(default)]
    final_choice: Option<String>,
    #[serde(default)]
    my_persona: Option<String>,
    #[serde(default)]
    ideal_preference: Option<String>,
}

/// POST /sessions
async fn create_session_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<Value>, ApiError> {
    let session_id = state
        .repository
        .create_session(
            request.user_id,
            request.final_choice,
            request.my_persona,
            request.ideal_preference,
        )
        .await
        .ok_or_else(|| store_unavailable("game_sessions"))?;
    Ok(Json(json!({ "session_id": session_id })))
}

#[derive(Debug, Deserialize)]
struct UpdateSessionRequest {
    final_choice: String,
    my_persona: String,
    ideal_preference: String,
}

/// PATCH /sessions/:session_id
async fn update_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<UpdateSessionRequest>,
) -> Result<Json<Value>, ApiError> {
    let updated = state
        .repository
        .update_session(
            &path_record_id(&session_id),
            &request.final_choice,
            &request.my_persona,
            &request.ideal_preference,
        )
        .await;
    if !updated {
        return Err(store_unavailable("game_sessions"));
    }
    Ok(Json(json!({ "updated": true })))
}

#[derive(Debug, Deserialize)]
struct SaveChatLogRequest {
    partner_type: Persona,
    history: Vec<ChatMessage>,
    turn_count: u32,
}

/// POST /sessions/:session_id/logs
async fn save_chat_log_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SaveChatLogRequest>,
) -> Result<Json<Value>, ApiError> {
    let log_id = state
        .repository
        .save_chat_log(
            path_record_id(&session_id),
            request.partner_type,
            &request.history,
            request.turn_count,
        )
        .await
        .ok_or_else(|| store_unavailable("chat_logs"))?;
    Ok(Json(json!({ "log_id": log_id })))
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    rounds: Vec<RoundRecord>,
}

/// POST /sessions/:session_id/analysis
///
/// A failed analysis is returned as `{"analysis": {"error": ...}}` and is
/// not stored.
async fn analysis_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.orchestrator.analyze_session(&request.rounds).await;
    let AnalysisOutcome::Completed(analysis) = &outcome else {
        return Ok(Json(json!({ "analysis": outcome, "analysis_id": null })));
    };

    let analysis_id = state
        .repository
        .save_analysis(path_record_id(&session_id), analysis)
        .await
        .ok_or_else(|| store_unavailable("analysis_results"))?;
    Ok(Json(json!({ "analysis": outcome, "analysis_id": analysis_id })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
