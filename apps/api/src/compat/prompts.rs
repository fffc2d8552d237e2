use serde_json::{json, Value};

pub const REPORT_PROMPT_TEMPLATE: &str = r#"
You are an aquarium expert. A user has selected a group of fish. Generate a tailored care guide and compatibility summary. Do not mention the scores in your summary, just provide the requested information.

Selected Fish: {fish}
Fish Type: {category}
Group Harmony Score: {harmony}
Conflict Risk Score: {conflict}

Provide a JSON object with the following:
1. "groupHarmonyScoreExplanation": A brief, user-friendly explanation of the Group Harmony Score. {harmony_method}
2. "conflictRiskScoreExplanation": A brief, user-friendly explanation of the Conflict Risk Score. Explain that it represents the "weakest link", the single most problematic pairing in the group.
3. "detailedSummary": A detailed summary of the potential interactions in this specific group of fish.
4. "tankSize": A recommended minimum tank size.
5. "decorations": Recommended decorations and setup.
6. "careGuide": A general care guide for this group.
7. "compatibleFish": A list of other fish that are compatible with ALL selected fish.
"#;

pub const HARMONY_PRODUCT_METHOD: &str = "Explain that it is calculated by multiplying the compatibility of all possible pairs, so a low score indicates multiple potential issues.";
pub const HARMONY_MINIMUM_METHOD: &str = "Explain that it is the lowest compatibility of any pair, so one poor pairing lowers the whole group.";

/// Response schema for the compatibility report.
pub fn report_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "groupHarmonyScoreExplanation": { "type": "STRING" },
            "conflictRiskScoreExplanation": { "type": "STRING" },
            "detailedSummary": { "type": "STRING" },
            "tankSize": { "type": "STRING" },
            "decorations": { "type": "STRING" },
            "careGuide": { "type": "STRING" },
            "compatibleFish": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": { "name": { "type": "STRING" } },
                    "required": ["name"]
                }
            }
        },
        "required": [
            "groupHarmonyScoreExplanation",
            "conflictRiskScoreExplanation",
            "detailedSummary",
            "tankSize",
            "decorations",
            "careGuide",
            "compatibleFish"
        ]
    })
}
