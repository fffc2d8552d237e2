use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalog::FishCatalog;
use crate::compat::CompatibilityScorer;
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup; read-only afterwards.
    pub catalog: Arc<FishCatalog>,
    /// Pluggable compatibility scorer. Default: RuleBasedScorer.
    pub scorer: Arc<dyn CompatibilityScorer>,
    pub llm: LlmClient,
    pub config: Config,
    /// Root token cancelled on shutdown; handlers hand child tokens to generative calls.
    pub shutdown: CancellationToken,
}
