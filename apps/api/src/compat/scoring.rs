//! Compatibility scoring — pairwise rules and group aggregation.
//!
//! Pairwise rule, first match wins:
//! 1. both fish list each other as compatible       → 1.0
//! 2. either lists the other as not compatible      → 0.0
//! 3. either lists the other as not recommended     → 0.25 (tiered scale only)
//! 4. either lists the other as "with caution"      → 0.75 tiered / 0.5 classic
//! 5. no relation recorded                          → 0.5
//!
//! Group harmony is the product (default) or the minimum of all pairwise
//! scores. Conflict risk is always the weakest single pairing.
//!
//! `AppState` holds an `Arc<dyn CompatibilityScorer>`, built at startup from config.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::catalog::{FishRecord, Relation};

pub const FULL_COMPATIBILITY: f64 = 1.0;
pub const NOT_COMPATIBLE: f64 = 0.0;
pub const NOT_RECOMMENDED: f64 = 0.25;
pub const UNKNOWN_RELATION: f64 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Which scoring scale to use for the "with caution" and "not recommended" tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringScale {
    /// caution = 0.75, not-recommended tier enabled.
    #[default]
    Tiered,
    /// caution = 0.5, not-recommended lists ignored.
    Classic,
}

impl ScoringScale {
    pub fn caution_score(&self) -> f64 {
        match self {
            ScoringScale::Tiered => 0.75,
            ScoringScale::Classic => 0.5,
        }
    }

    pub fn has_not_recommended_tier(&self) -> bool {
        matches!(self, ScoringScale::Tiered)
    }
}

impl FromStr for ScoringScale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiered" => Ok(ScoringScale::Tiered),
            "classic" => Ok(ScoringScale::Classic),
            other => anyhow::bail!("unknown scoring scale '{other}' (expected tiered|classic)"),
        }
    }
}

/// How pairwise scores are folded into the group harmony score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Multiply all pairs: many mediocre pairings compound into a low score.
    #[default]
    Product,
    /// Weakest link: one bad pairing decides the group.
    Minimum,
}

impl FromStr for Aggregation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "product" => Ok(Aggregation::Product),
            "minimum" | "min" => Ok(Aggregation::Minimum),
            other => anyhow::bail!("unknown aggregation '{other}' (expected product|minimum)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringConfig {
    pub scale: ScoringScale,
    pub aggregation: Aggregation,
    /// Amplitude of the uniform jitter added to each pairwise score. `None` disables it.
    pub jitter: Option<f64>,
    /// Seed for the jitter source. Unseeded scorers draw from OS entropy.
    pub seed: Option<u64>,
}

impl ScoringConfig {
    pub const DEFAULT_JITTER: f64 = 0.05;
}

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub fish_a: String,
    pub fish_b: String,
    pub score: f64,
}

/// Scores for one selection. `pairs` is ordered by (i, j) with j > i.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityScores {
    pub pairs: Vec<PairScore>,
    pub group_harmony: f64,
    pub conflict_risk: f64,
    pub aggregation: Aggregation,
    pub harmony_equation: String,
    pub conflict_equation: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching handlers.
pub trait CompatibilityScorer: Send + Sync {
    fn score(&self, selection: &[FishRecord]) -> CompatibilityScores;
}

/// The dataset-driven scorer. The RNG is only touched when jitter is enabled.
pub struct RuleBasedScorer {
    config: ScoringConfig,
    rng: Mutex<StdRng>,
}

impl RuleBasedScorer {
    pub fn new(config: ScoringConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }
}

impl CompatibilityScorer for RuleBasedScorer {
    fn score(&self, selection: &[FishRecord]) -> CompatibilityScores {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        score_group(selection, &self.config, &mut *rng)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core algorithm
// ────────────────────────────────────────────────────────────────────────────

/// Pairwise compatibility of two fish, checked from both sides.
pub fn pairwise_score(a: &FishRecord, b: &FishRecord, scale: ScoringScale) -> f64 {
    let either = |relation: Relation| a.lists(relation, &b.name) || b.lists(relation, &a.name);

    if a.lists(Relation::Compatible, &b.name) && b.lists(Relation::Compatible, &a.name) {
        FULL_COMPATIBILITY
    } else if either(Relation::NotCompatible) {
        NOT_COMPATIBLE
    } else if scale.has_not_recommended_tier() && either(Relation::NotRecommended) {
        NOT_RECOMMENDED
    } else if either(Relation::WithCaution) {
        scale.caution_score()
    } else {
        UNKNOWN_RELATION
    }
}

/// Moves `score` by a uniform offset in `[-amplitude, amplitude]`, clamped to [0, 1].
pub fn apply_jitter<R: Rng + ?Sized>(score: f64, amplitude: f64, rng: &mut R) -> f64 {
    if amplitude <= 0.0 {
        return score;
    }
    (score + rng.gen_range(-amplitude..=amplitude)).clamp(0.0, 1.0)
}

/// Scores every unordered pair of the selection and aggregates the group.
pub fn score_group<R: Rng + ?Sized>(
    selection: &[FishRecord],
    config: &ScoringConfig,
    rng: &mut R,
) -> CompatibilityScores {
    let mut pairs = Vec::new();
    for (i, a) in selection.iter().enumerate() {
        for b in &selection[i + 1..] {
            let mut score = pairwise_score(a, b, config.scale);
            if let Some(amplitude) = config.jitter {
                score = apply_jitter(score, amplitude, rng);
            }
            pairs.push(PairScore {
                fish_a: a.name.clone(),
                fish_b: b.name.clone(),
                score,
            });
        }
    }

    let conflict_risk = pairs
        .iter()
        .map(|p| p.score)
        .fold(FULL_COMPATIBILITY, f64::min);
    let group_harmony = match config.aggregation {
        Aggregation::Product => pairs.iter().map(|p| p.score).product::<f64>(),
        Aggregation::Minimum => conflict_risk,
    };

    let (harmony_equation, conflict_equation) = if pairs.is_empty() {
        ("100%".to_string(), "100%".to_string())
    } else {
        let terms: Vec<String> = pairs.iter().map(|p| format_percent(p.score)).collect();
        let min_equation = format!(
            "min({}) = {:.1}%",
            terms.join(", "),
            conflict_risk * 100.0
        );
        let harmony_equation = match config.aggregation {
            Aggregation::Product => {
                format!("{} = {:.1}%", terms.join(" × "), group_harmony * 100.0)
            }
            Aggregation::Minimum => min_equation.clone(),
        };
        (harmony_equation, min_equation)
    };

    CompatibilityScores {
        pairs,
        group_harmony,
        conflict_risk,
        aggregation: config.aggregation,
        harmony_equation,
        conflict_equation,
    }
}

/// `0.5` → `"50%"`, `0.7234` → `"72.3%"`.
pub fn format_percent(score: f64) -> String {
    let pct = score * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{pct:.0}%")
    } else {
        format!("{pct:.1}%")
    }
}

impl fmt::Display for CompatibilityScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "harmony {:.1}% / conflict risk {:.1}% over {} pair(s)",
            self.group_harmony * 100.0,
            self.conflict_risk * 100.0,
            self.pairs.len()
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
