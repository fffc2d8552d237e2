//! Compatibility Report — local scores plus an AI-written care guide.
//!
//! Flow: score selection locally → prompt with the scores → structured
//! generative call → enrich suggested fish from the catalog.
//! A reply that does not match the schema still produces a report, with the
//! raw text as the summary.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::catalog::{Category, FishCatalog};
use crate::compat::prompts::{
    report_schema, HARMONY_MINIMUM_METHOD, HARMONY_PRODUCT_METHOD, REPORT_PROMPT_TEMPLATE,
};
use crate::compat::scoring::{Aggregation, CompatibilityScorer, CompatibilityScores};
use crate::compat::selection::Selection;
use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{GenerateContentRequest, LlmClient};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedFish {
    pub name: String,
    /// Filled from the catalog when the model names a fish we know.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// The model's half of the report. Field names arrive in camelCase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct AiReport {
    #[serde(default)]
    pub group_harmony_score_explanation: String,
    #[serde(default)]
    pub conflict_risk_score_explanation: String,
    #[serde(default)]
    pub detailed_summary: String,
    #[serde(default)]
    pub tank_size: String,
    #[serde(default)]
    pub decorations: String,
    #[serde(default)]
    pub care_guide: String,
    #[serde(default)]
    pub compatible_fish: Vec<SuggestedFish>,
}

impl AiReport {
    /// Best-effort report when the model reply is not valid JSON.
    pub fn from_raw_text(raw: &str) -> Self {
        Self {
            detailed_summary: raw.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityReport {
    pub category: Category,
    pub fish: Vec<String>,
    pub scores: CompatibilityScores,
    pub report: AiReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Report pipeline
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_report(
    llm: &LlmClient,
    catalog: &FishCatalog,
    scorer: &dyn CompatibilityScorer,
    category: Category,
    selection: &Selection,
    cancel: &CancellationToken,
) -> Result<CompatibilityReport, AppError> {
    if selection.is_empty() {
        return Err(AppError::Validation(
            "Select at least one fish to get a report.".to_string(),
        ));
    }

    let scores = scorer.score(selection.as_slice());
    info!("Compatibility for [{}]: {scores}", selection.names().join(", "));

    let prompt = build_prompt(category, selection, &scores);
    let mut report: AiReport = llm
        .call_structured(
            GenerateContentRequest::user_prompt(prompt),
            report_schema(),
            cancel,
            AiReport::from_raw_text,
        )
        .await?;

    for suggested in &mut report.compatible_fish {
        if let Some(known) = catalog.find(category, &suggested.name) {
            suggested.image_url = known.image_url.clone();
        }
    }

    Ok(CompatibilityReport {
        category,
        fish: selection.names().into_iter().map(String::from).collect(),
        scores,
        report,
    })
}

fn build_prompt(category: Category, selection: &Selection, scores: &CompatibilityScores) -> String {
    let method = match scores.aggregation {
        Aggregation::Product => HARMONY_PRODUCT_METHOD,
        Aggregation::Minimum => HARMONY_MINIMUM_METHOD,
    };
    let fish = selection.names().join(", ");
    let harmony = format!("{:.1}%", scores.group_harmony * 100.0);
    let conflict = format!("{:.1}%", scores.conflict_risk * 100.0);
    fill_template(
        REPORT_PROMPT_TEMPLATE,
        &[
            ("fish", fish.as_str()),
            ("category", category.as_str()),
            ("harmony", harmony.as_str()),
            ("conflict", conflict.as_str()),
            ("harmony_method", method),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BUNDLED_DATASET;
    use crate::compat::scoring::{RuleBasedScorer, ScoringConfig};
    use crate::llm_client::testing::{client, ScriptedTransport, Step};
    use serde_json::json;

    fn catalog() -> FishCatalog {
        FishCatalog::from_json_str(BUNDLED_DATASET).unwrap()
    }

    fn selection(names: &[&str]) -> Selection {
        Selection::from_names(&catalog(), Category::Freshwater, names).unwrap()
    }

    #[test]
    fn test_prompt_carries_names_and_scores() {
        let sel = selection(&["Neon Tetra", "Corydoras"]);
        let scores = RuleBasedScorer::new(ScoringConfig::default()).score(sel.as_slice());
        let prompt = build_prompt(Category::Freshwater, &sel, &scores);

        assert!(prompt.contains("Selected Fish: Neon Tetra, Corydoras"));
        assert!(prompt.contains("Fish Type: freshwater"));
        assert!(prompt.contains("Group Harmony Score: 100.0%"));
        assert!(prompt.contains("multiplying"));
    }

    #[test]
    fn test_ai_report_reads_camel_case() {
        let report: AiReport = serde_json::from_value(json!({
            "detailedSummary": "Peaceful community.",
            "tankSize": "20 gallons",
            "compatibleFish": [{ "name": "Guppy" }]
        }))
        .unwrap();
        assert_eq!(report.detailed_summary, "Peaceful community.");
        assert_eq!(report.tank_size, "20 gallons");
        assert_eq!(report.compatible_fish[0].name, "Guppy");
        assert!(report.care_guide.is_empty());
    }

    #[tokio::test]
    async fn test_report_merges_scores_and_enriches_fish() {
        let ai = json!({
            "groupHarmonyScoreExplanation": "h",
            "conflictRiskScoreExplanation": "c",
            "detailedSummary": "Calm group.",
            "tankSize": "20 gallons",
            "decorations": "Plants",
            "careGuide": "Stable temps",
            "compatibleFish": [{ "name": "Harlequin Rasbora" }, { "name": "Kuhli Loach" }]
        });
        let transport = ScriptedTransport::new(vec![Step::ok_text(&ai.to_string())]);
        let llm = client(transport.clone());
        let scorer = RuleBasedScorer::new(ScoringConfig::default());
        let sel = selection(&["Neon Tetra", "Corydoras"]);

        let report = generate_report(
            &llm,
            &catalog(),
            &scorer,
            Category::Freshwater,
            &sel,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.fish, vec!["Neon Tetra", "Corydoras"]);
        assert_eq!(report.scores.group_harmony, 1.0);
        assert_eq!(report.report.detailed_summary, "Calm group.");
        assert!(report.report.compatible_fish[0].image_url.is_some());
        assert!(report.report.compatible_fish[1].image_url.is_none());

        let sent = transport.requests();
        assert!(sent[0].generation_config.is_some());
    }

    #[tokio::test]
    async fn test_report_falls_back_to_raw_text() {
        let transport = ScriptedTransport::new(vec![Step::ok_text("Not JSON at all")]);
        let llm = client(transport);
        let scorer = RuleBasedScorer::new(ScoringConfig::default());

        let report = generate_report(
            &llm,
            &catalog(),
            &scorer,
            Category::Freshwater,
            &selection(&["Betta", "Guppy"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.report.detailed_summary, "Not JSON at all");
        assert_eq!(report.scores.group_harmony, 0.0);
    }

    #[tokio::test]
    async fn test_empty_selection_is_rejected_without_calling_llm() {
        let transport = ScriptedTransport::new(vec![Step::ok_text("{}")]);
        let llm = client(transport.clone());
        let scorer = RuleBasedScorer::new(ScoringConfig::default());

        let err = generate_report(
            &llm,
            &catalog(),
            &scorer,
            Category::Freshwater,
            &Selection::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(transport.calls(), 0);
    }
}
