use serde_json::{json, Value};

use crate::llm_client::prompts::{fill_template, HOME_ASSISTANT_LINK, STORE_LINK};

/// Questions offered on a fresh session.
pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "What is AquaPi?",
    "Compare AquaPi to Apex Neptune",
    "What parameters can AquaPi monitor?",
    "Can I use my own sensors?",
];

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Act as an aquarium expert. Analyze the following water parameters for a {tank_type} aquarium:
{readings}
Provide a detailed but easy-to-understand analysis. Respond with a JSON object. IMPORTANT: For the 'value' field of the temperature parameter, you MUST use the original user-provided value which is '{display_temp}'. The status for each parameter and the overall summary MUST be one of "Good", "Needs Attention", or "Bad". The 'howAquaPiHelps' section should conclude with a subtle link to our store: {store_link}.
The JSON structure must be:
{
  "summary": { "status": "Good" | "Needs Attention" | "Bad", "title": "...", "message": "..." },
  "parameters": [ { "name": "Temperature", "value": "{display_temp}", "idealRange": "...", "status": "Good" | "Needs Attention" | "Bad", "advice": "..." } ],
  "howAquaPiHelps": "..."
}"#;

pub const AUTOMATION_PROMPT_TEMPLATE: &str = r#"You are an expert on Home Assistant and ESPHome. A user wants to create a simple automation for their aquarium. Based on the user's description, provide a valid and well-commented YAML code snippet for either a Home Assistant automation or an ESPHome configuration. Also, provide a brief, friendly explanation of what the code does and where it should be placed.
User's request: "{description}"
Respond with a JSON object with this exact structure: { "title": "Automation for [User's Request]", "explanation": "A Markdown-formatted explanation of the script that concludes with subtle links to our store: {store_link} and the Home Assistant website: {home_assistant_link}.", "code": "The YAML code block as a string, including newline characters (\\n) for proper formatting." }"#;

pub fn analysis_prompt(tank_type: &str, readings: &str, display_temp: &str) -> String {
    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("tank_type", tank_type),
            ("readings", readings),
            ("display_temp", display_temp),
            ("store_link", STORE_LINK),
        ],
    )
}

pub fn automation_prompt(description: &str) -> String {
    fill_template(
        AUTOMATION_PROMPT_TEMPLATE,
        &[
            ("description", description),
            ("store_link", STORE_LINK),
            ("home_assistant_link", HOME_ASSISTANT_LINK),
        ],
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Response schemas
// ────────────────────────────────────────────────────────────────────────────

pub fn suggestion_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "content": { "type": "STRING" },
            "followUps": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["title", "content", "followUps"]
    })
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "OBJECT",
                "properties": {
                    "status": { "type": "STRING" },
                    "title": { "type": "STRING" },
                    "message": { "type": "STRING" }
                },
                "required": ["status", "title", "message"]
            },
            "parameters": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "value": { "type": "STRING" },
                        "idealRange": { "type": "STRING" },
                        "status": { "type": "STRING" },
                        "advice": { "type": "STRING" }
                    },
                    "required": ["name", "value", "idealRange", "status", "advice"]
                }
            },
            "howAquaPiHelps": { "type": "STRING" }
        },
        "required": ["summary", "parameters", "howAquaPiHelps"]
    })
}

pub fn automation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "explanation": { "type": "STRING" },
            "code": { "type": "STRING" }
        },
        "required": ["title", "explanation", "code"]
    })
}
