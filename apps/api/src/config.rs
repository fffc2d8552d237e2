use anyhow::{Context, Result};

use crate::compat::scoring::{Aggregation, ScoringConfig, ScoringScale};
use crate::llm_client::DEFAULT_BASE_URL;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    /// Path to a fish dataset overriding the bundled one.
    pub fish_data_path: Option<String>,
    pub scoring: ScoringConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let scale = match optional_env("SCORING_SCALE") {
            Some(v) => v.parse::<ScoringScale>().context("SCORING_SCALE")?,
            None => ScoringScale::default(),
        };
        let aggregation = match optional_env("HARMONY_AGGREGATION") {
            Some(v) => v.parse::<Aggregation>().context("HARMONY_AGGREGATION")?,
            None => Aggregation::default(),
        };
        let jitter = optional_env("SCORING_JITTER")
            .map(|v| v.parse::<bool>())
            .transpose()
            .context("SCORING_JITTER must be true or false")?
            .unwrap_or(false);
        let seed = optional_env("SCORING_SEED")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("SCORING_SEED must be an unsigned integer")?;

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fish_data_path: optional_env("FISH_DATA_PATH"),
            scoring: ScoringConfig {
                scale,
                aggregation,
                jitter: jitter.then_some(ScoringConfig::DEFAULT_JITTER),
                seed,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
