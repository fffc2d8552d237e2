use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::catalog::Category;
use crate::llm_client::MODEL;
use crate::state::AppState;

/// GET /health
/// Returns service version, dataset size per category and the active scoring setup.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let catalog: serde_json::Map<String, Value> = Category::ALL
        .iter()
        .map(|c| (c.to_string(), json!(state.catalog.fish(*c).len())))
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "aquapi-api",
        "model": MODEL,
        "catalog": catalog,
        "scoring": {
            "scale": state.config.scoring.scale,
            "aggregation": state.config.scoring.aggregation,
            "jitter": state.config.scoring.jitter.is_some(),
        }
    }))
}
