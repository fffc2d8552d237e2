//! Axum route handlers for the fish catalog and compatibility API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CatalogError, Category, FishRecord};
use crate::compat::report::{generate_report, CompatibilityReport};
use crate::compat::scoring::CompatibilityScores;
use crate::compat::selection::Selection;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct FishListResponse {
    pub category: Category,
    pub fish: Vec<FishRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CompatRequest {
    #[serde(default)]
    pub category: Category,
    pub fish: Vec<String>,
}

/// The current selection plus one edit: clear it, then toggle a fish.
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub fish: Vec<String>,
    #[serde(default)]
    pub clear: bool,
    #[serde(default)]
    pub toggle: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub category: Category,
    pub fish: Vec<String>,
    pub scores: CompatibilityScores,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/fish?category=freshwater
pub async fn handle_list_fish(
    State(state): State<AppState>,
    Query(params): Query<CategoryQuery>,
) -> Json<FishListResponse> {
    Json(FishListResponse {
        category: params.category,
        fish: state.catalog.fish(params.category).to_vec(),
    })
}

/// POST /api/v1/compat/score
///
/// Local scores only; no generative call.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<CompatRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let selection = Selection::from_names(&state.catalog, request.category, &request.fish)?;
    let scores = state.scorer.score(selection.as_slice());

    Ok(Json(ScoreResponse {
        category: request.category,
        fish: selection.names().into_iter().map(String::from).collect(),
        scores,
    }))
}

/// POST /api/v1/compat/selection
///
/// Applies one edit to the client's selection and rescores it.
pub async fn handle_selection(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let category = request.category;
    let mut selection = Selection::from_names(&state.catalog, category, &request.fish)?;

    if request.clear {
        selection.clear();
    }
    if let Some(name) = request.toggle {
        let fish = state
            .catalog
            .find(category, &name)
            .cloned()
            .ok_or(CatalogError::UnknownFish { category, name })?;
        selection.toggle(fish);
    }
    debug!("Selection now holds {} fish", selection.len());

    let scores = state.scorer.score(selection.as_slice());
    Ok(Json(ScoreResponse {
        category,
        fish: selection.names().into_iter().map(String::from).collect(),
        scores,
    }))
}

/// POST /api/v1/compat/report
///
/// Scores plus the AI-written care guide for the selection.
pub async fn handle_report(
    State(state): State<AppState>,
    Json(request): Json<CompatRequest>,
) -> Result<Json<CompatibilityReport>, AppError> {
    let selection = Selection::from_names(&state.catalog, request.category, &request.fish)?;
    let cancel = state.shutdown.child_token();

    let report = generate_report(
        &state.llm,
        &state.catalog,
        state.scorer.as_ref(),
        request.category,
        &selection,
        &cancel,
    )
    .await?;

    Ok(Json(report))
}
