pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::calculators::handlers as calculators;
use crate::chat::handlers as chat;
use crate::compat::handlers as compat;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Fish compatibility
        .route("/api/v1/fish", get(compat::handle_list_fish))
        .route("/api/v1/compat/score", post(compat::handle_score))
        .route("/api/v1/compat/selection", post(compat::handle_selection))
        .route("/api/v1/compat/report", post(compat::handle_report))
        // Chat assistant
        .route("/api/v1/chat/session", get(chat::handle_new_session))
        .route("/api/v1/chat/message", post(chat::handle_message))
        .route("/api/v1/chat/suggestion", post(chat::handle_suggestion))
        .route(
            "/api/v1/chat/water-analysis",
            post(chat::handle_water_analysis),
        )
        .route("/api/v1/chat/automation", post(chat::handle_automation))
        // Calculators
        .route("/api/v1/calculators/co2", post(calculators::handle_co2))
        .route(
            "/api/v1/calculators/alkalinity",
            post(calculators::handle_alkalinity),
        )
        .route(
            "/api/v1/calculators/temperature",
            post(calculators::handle_temperature),
        )
        .route(
            "/api/v1/calculators/tank-volume",
            post(calculators::handle_tank_volume),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::{FishCatalog, BUNDLED_DATASET};
    use crate::compat::scoring::ScoringConfig;
    use crate::compat::RuleBasedScorer;
    use crate::config::Config;
    use crate::llm_client::testing::{client, ScriptedTransport, Step};
    use crate::llm_client::DEFAULT_BASE_URL;

    fn state(steps: Vec<Step>) -> (AppState, Arc<ScriptedTransport>) {
        let transport = ScriptedTransport::new(steps);
        let config = Config {
            gemini_api_key: "test-key".to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            fish_data_path: None,
            scoring: ScoringConfig::default(),
            port: 0,
            rust_log: "info".to_string(),
        };
        let state = AppState {
            catalog: Arc::new(FishCatalog::from_json_str(BUNDLED_DATASET).unwrap()),
            scorer: Arc::new(RuleBasedScorer::new(config.scoring.clone())),
            llm: client(transport.clone()),
            config,
            shutdown: CancellationToken::new(),
        };
        (state, transport)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_reports_catalog() {
        let (state, _) = state(vec![]);
        let (status, body) = send(build_router(state), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "aquapi-api");
        assert!(body["catalog"]["freshwater"].as_u64().unwrap() > 0);
        assert_eq!(body["scoring"]["scale"], "tiered");
    }

    #[tokio::test]
    async fn test_list_marine_fish() {
        let (state, _) = state(vec![]);
        let (status, body) =
            send(build_router(state), Method::GET, "/api/v1/fish?category=marine", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "marine");
        let names: Vec<&str> = body["fish"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Ocellaris Clownfish"));
    }

    #[tokio::test]
    async fn test_score_incompatible_pair() {
        let (state, transport) = state(vec![]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/compat/score",
            Some(json!({ "category": "freshwater", "fish": ["Betta", "Guppy"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scores"]["group_harmony"], 0.0);
        assert_eq!(body["scores"]["conflict_risk"], 0.0);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_score_unknown_fish_is_not_found() {
        let (state, _) = state(vec![]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/compat/score",
            Some(json!({ "fish": ["Kuhli Loach"] })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_selection_toggle_adds_and_removes() {
        let (state, _) = state(vec![]);
        let app = build_router(state);

        let (status, added) = send(
            app.clone(),
            Method::POST,
            "/api/v1/compat/selection",
            Some(json!({ "fish": ["Neon Tetra"], "toggle": "Corydoras" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(added["fish"], json!(["Neon Tetra", "Corydoras"]));
        assert_eq!(added["scores"]["group_harmony"], 1.0);

        let (_, removed) = send(
            app,
            Method::POST,
            "/api/v1/compat/selection",
            Some(json!({ "fish": ["Neon Tetra", "Corydoras"], "toggle": "Neon Tetra" })),
        )
        .await;
        assert_eq!(removed["fish"], json!(["Corydoras"]));
    }

    #[tokio::test]
    async fn test_selection_clear_then_toggle() {
        let (state, _) = state(vec![]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/compat/selection",
            Some(json!({ "fish": ["Betta", "Guppy"], "clear": true, "toggle": "Oscar" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fish"], json!(["Oscar"]));
        assert!(body["scores"]["pairs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_selection_toggle_unknown_fish_is_not_found() {
        let (state, _) = state(vec![]);
        let (status, _) = send(
            build_router(state),
            Method::POST,
            "/api/v1/compat/selection",
            Some(json!({ "toggle": "Kuhli Loach" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_with_empty_selection_is_bad_request() {
        let (state, transport) = state(vec![Step::ok_text("{}")]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/compat/report",
            Some(json!({ "category": "freshwater", "fish": [] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_upstream_failure_is_bad_gateway() {
        let (state, transport) = state(vec![Step::status(500)]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/compat/report",
            Some(json!({ "fish": ["Neon Tetra", "Corydoras"] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["error"]["message"],
            crate::llm_client::CONNECTION_TROUBLE_MESSAGE
        );
        assert_eq!(transport.calls(), 5);
    }

    #[tokio::test]
    async fn test_report_after_shutdown_is_silent() {
        let (state, transport) = state(vec![Step::ok_text("unused")]);
        state.shutdown.cancel();
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/compat/report",
            Some(json!({ "fish": ["Neon Tetra", "Corydoras"] })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, Value::Null);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_new_chat_session() {
        let (state, _) = state(vec![]);
        let (status, body) =
            send(build_router(state), Method::GET, "/api/v1/chat/session", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["history"][0]["role"], "model");
        assert_eq!(body["session"]["busy"], false);
        assert_eq!(body["suggested_questions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_chat_message_round_trip() {
        let (state, _) = state(vec![Step::ok_text("Hello from AquaPi")]);
        let app = build_router(state);

        let (_, opened) = send(app.clone(), Method::GET, "/api/v1/chat/session", None).await;
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/chat/message",
            Some(json!({ "session": opened["session"], "message": "Hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "delivered");
        let history = body["session"]["history"].as_array().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2]["text"], "Hello from AquaPi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_failure_is_reported_in_session() {
        let (state, _) = state(vec![Step::status(500)]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/chat/message",
            Some(json!({ "message": "Hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "failed");
        assert_eq!(body["session"]["busy"], false);
        let history = body["session"]["history"].as_array().unwrap();
        assert_eq!(
            history.last().unwrap()["text"],
            crate::llm_client::CONNECTION_TROUBLE_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_chat_after_shutdown_is_cancelled_silently() {
        let (state, transport) = state(vec![Step::ok_text("unused")]);
        state.shutdown.cancel();
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/chat/message",
            Some(json!({ "message": "Hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "cancelled");
        assert_eq!(body["session"]["history"].as_array().unwrap().len(), 2);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_co2_calculator() {
        let (state, _) = state(vec![]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/calculators/co2",
            Some(json!({ "ph": 6.37, "dkh": 1.0 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let ppm = body["co2_ppm"].as_f64().unwrap();
        assert!((ppm - 12.839).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_calculator_rejects_invalid_input() {
        let (state, _) = state(vec![]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/calculators/alkalinity",
            Some(json!({ "value": 0.0, "unit": "dKH" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_tank_volume_calculator() {
        let (state, _) = state(vec![]);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/v1/calculators/tank-volume",
            Some(json!({ "shape": "cube", "length": 1.0, "units": "feet" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cubic_inches"], 1728.0);
    }
}
