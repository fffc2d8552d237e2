// Fish compatibility: selection, pairwise scoring and AI-backed reports.
// All generative calls go through llm_client; scoring itself is pure.

pub mod handlers;
pub mod prompts;
pub mod report;
pub mod scoring;
pub mod selection;

pub use scoring::{CompatibilityScorer, RuleBasedScorer};
