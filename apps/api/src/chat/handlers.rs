//! Axum route handlers for the chat assistant.
//!
//! Handlers are stateless with respect to the conversation: the client sends
//! its session with every request and gets the updated one back.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::chat::assistant::{
    analyze_water, ask_suggestion, generate_automation, send_message, WaterParameters,
};
use crate::chat::models::ChatSession;
use crate::chat::prompts::SUGGESTED_QUESTIONS;
use crate::chat::session::DispatchOutcome;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session: ChatSession,
    pub suggested_questions: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub session: ChatSession,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    #[serde(default)]
    pub session: ChatSession,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct WaterAnalysisRequest {
    #[serde(default)]
    pub session: ChatSession,
    pub params: WaterParameters,
}

#[derive(Debug, Deserialize)]
pub struct AutomationRequest {
    #[serde(default)]
    pub session: ChatSession,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session: ChatSession,
    pub outcome: DispatchOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/chat/session
pub async fn handle_new_session() -> Json<NewSessionResponse> {
    Json(NewSessionResponse {
        session: ChatSession::new(),
        suggested_questions: SUGGESTED_QUESTIONS.to_vec(),
    })
}

/// POST /api/v1/chat/message
pub async fn handle_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let mut session = req.session;
    let cancel = state.shutdown.child_token();
    let outcome = send_message(&state.llm, &mut session, &req.message, &cancel).await?;
    Ok(Json(ChatResponse { session, outcome }))
}

/// POST /api/v1/chat/suggestion
pub async fn handle_suggestion(
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let mut session = req.session;
    let cancel = state.shutdown.child_token();
    let outcome = ask_suggestion(&state.llm, &mut session, &req.question, &cancel).await?;
    Ok(Json(ChatResponse { session, outcome }))
}

/// POST /api/v1/chat/water-analysis
pub async fn handle_water_analysis(
    State(state): State<AppState>,
    Json(req): Json<WaterAnalysisRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let mut session = req.session;
    let cancel = state.shutdown.child_token();
    let outcome = analyze_water(&state.llm, &mut session, &req.params, &cancel).await?;
    Ok(Json(ChatResponse { session, outcome }))
}

/// POST /api/v1/chat/automation
pub async fn handle_automation(
    State(state): State<AppState>,
    Json(req): Json<AutomationRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let mut session = req.session;
    let cancel = state.shutdown.child_token();
    let outcome = generate_automation(&state.llm, &mut session, &req.description, &cancel).await?;
    Ok(Json(ChatResponse { session, outcome }))
}
