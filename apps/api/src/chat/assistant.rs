//! Chat flows: free chat, suggested questions, water analysis and
//! automation scripts. Each flow records the user turn, builds its request and
//! hands the reply to `dispatch` with a flow-specific callback.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::calculators::water::{convert_temperature, TempUnit};
use crate::chat::models::{
    Attachment, AutomationScript, ChatSession, Role, SuggestionAnswer, WaterAnalysis,
};
use crate::chat::prompts::{
    analysis_prompt, analysis_schema, automation_prompt, automation_schema, suggestion_schema,
};
use crate::chat::session::{dispatch, DispatchOutcome};
use crate::errors::AppError;
use crate::llm_client::prompts::with_persona;
use crate::llm_client::{parse_structured, GenerateContentRequest, LlmClient};

pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Sorry, there was an error processing the analysis results.";
pub const SCRIPT_FAILED_PREFIX: &str =
    "Sorry, there was an error generating the script. Here is the raw text:\n\n";

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Free chat. The whole history goes out with the request.
pub async fn send_message(
    llm: &LlmClient,
    session: &mut ChatSession,
    message: &str,
    cancel: &CancellationToken,
) -> Result<DispatchOutcome, AppError> {
    require_text("message", message)?;
    session.push(Role::User, message.trim());

    let request = GenerateContentRequest {
        contents: session.to_contents(),
        generation_config: None,
    };
    Ok(dispatch(llm, session, &request, cancel, |s, text| {
        s.push(Role::Model, text);
    })
    .await)
}

/// Suggested question. The structured answer is attached to the question turn.
pub async fn ask_suggestion(
    llm: &LlmClient,
    session: &mut ChatSession,
    question: &str,
    cancel: &CancellationToken,
) -> Result<DispatchOutcome, AppError> {
    require_text("question", question)?;
    let question = question.trim();
    let asked = session.push(Role::User, question);

    let request =
        GenerateContentRequest::user_prompt(with_persona(question)).with_schema(suggestion_schema());
    Ok(dispatch(llm, session, &request, cancel, |s, text| {
        let answer = parse_structured::<SuggestionAnswer>(&text).unwrap_or_else(|e| {
            warn!("Suggestion reply did not parse: {e}");
            SuggestionAnswer::fallback(question, &text)
        });
        s.attach(asked, Attachment::Suggestion(answer));
    })
    .await)
}

// ────────────────────────────────────────────────────────────────────────────
// Water analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SalinityUnit {
    #[default]
    #[serde(rename = "ppt")]
    Ppt,
    #[serde(rename = "SG", alias = "sg")]
    SpecificGravity,
}

impl SalinityUnit {
    fn short(&self) -> &'static str {
        match self {
            SalinityUnit::Ppt => "ppt",
            SalinityUnit::SpecificGravity => "SG",
        }
    }

    fn long(&self) -> &'static str {
        match self {
            SalinityUnit::Ppt => "ppt",
            SalinityUnit::SpecificGravity => "Specific Gravity (SG)",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaterParameters {
    #[serde(alias = "tankType")]
    pub tank_type: String,
    #[serde(default)]
    pub ph: Option<f64>,
    pub temp: f64,
    #[serde(default, alias = "tempUnit")]
    pub temp_unit: TempUnit,
    #[serde(default)]
    pub salinity: Option<f64>,
    #[serde(default, alias = "salinityUnit")]
    pub salinity_unit: SalinityUnit,
    #[serde(default, alias = "additionalInfo")]
    pub additional_info: Option<String>,
}

impl WaterParameters {
    fn display_temp(&self) -> String {
        format!("{}°{}", self.temp, self.temp_unit)
    }

    fn additional_info(&self) -> Option<&str> {
        self.additional_info
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The readable summary recorded as the user's turn.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Please analyze my water parameters for my {} tank. Temp: {}",
            self.tank_type.trim(),
            self.display_temp()
        );
        if let Some(ph) = self.ph {
            text.push_str(&format!(", pH: {ph}"));
        }
        if let Some(salinity) = self.salinity {
            text.push_str(&format!(", Salinity: {salinity} {}", self.salinity_unit.short()));
        }
        if let Some(info) = self.additional_info() {
            text.push_str(&format!(", Additional Info: {info}"));
        }
        text.push('.');
        text
    }

    /// Reading lines for the prompt, temperature in °C.
    fn readings(&self) -> Result<String, AppError> {
        let reading = convert_temperature(self.temp, self.temp_unit)?;
        let celsius = match self.temp_unit {
            TempUnit::Celsius => format!("{}", self.temp),
            TempUnit::Fahrenheit => format!("{:.2}", reading.celsius),
        };

        let mut lines = Vec::new();
        if let Some(ph) = self.ph {
            lines.push(format!("- pH: {ph}"));
        }
        lines.push(format!("- Temperature: {celsius}°C"));
        if let Some(salinity) = self.salinity {
            lines.push(format!("- Salinity: {salinity} {}", self.salinity_unit.long()));
        }
        if let Some(info) = self.additional_info() {
            lines.push(format!("- Additional Information: {info}"));
        }
        Ok(lines.join("\n"))
    }
}

pub async fn analyze_water(
    llm: &LlmClient,
    session: &mut ChatSession,
    params: &WaterParameters,
    cancel: &CancellationToken,
) -> Result<DispatchOutcome, AppError> {
    require_text("tank_type", &params.tank_type)?;
    let readings = params.readings()?;
    let asked = session.push(Role::User, params.summary());

    let prompt = analysis_prompt(params.tank_type.trim(), &readings, &params.display_temp());
    let request = GenerateContentRequest::user_prompt(prompt).with_schema(analysis_schema());
    Ok(dispatch(llm, session, &request, cancel, |s, text| {
        match parse_structured::<WaterAnalysis>(&text) {
            Ok(analysis) => {
                s.attach(asked, Attachment::WaterAnalysis(analysis));
            }
            Err(e) => {
                warn!("Water analysis reply did not parse: {e}");
                s.push(Role::Model, ANALYSIS_FAILED_MESSAGE);
            }
        }
    })
    .await)
}

pub async fn generate_automation(
    llm: &LlmClient,
    session: &mut ChatSession,
    description: &str,
    cancel: &CancellationToken,
) -> Result<DispatchOutcome, AppError> {
    require_text("description", description)?;
    let description = description.trim();
    let asked = session.push(
        Role::User,
        format!("Generate an automation script for: \"{description}\""),
    );

    let request = GenerateContentRequest::user_prompt(automation_prompt(description))
        .with_schema(automation_schema());
    Ok(dispatch(llm, session, &request, cancel, |s, text| {
        match parse_structured::<AutomationScript>(&text) {
            Ok(script) => {
                s.attach(asked, Attachment::Automation(script));
            }
            Err(e) => {
                warn!("Automation reply did not parse: {e}");
                s.push(Role::Model, format!("{SCRIPT_FAILED_PREFIX}{text}"));
            }
        }
    })
    .await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::ParameterStatus;
    use crate::llm_client::prompts::PERSONA_PROMPT;
    use crate::llm_client::testing::{client, ScriptedTransport, Step};
    use serde_json::json;

    fn params(unit: TempUnit, temp: f64) -> WaterParameters {
        WaterParameters {
            tank_type: "Reef".to_string(),
            ph: Some(8.2),
            temp,
            temp_unit: unit,
            salinity: Some(1.025),
            salinity_unit: SalinityUnit::SpecificGravity,
            additional_info: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_free_chat_appends_reply_and_sends_history() {
        let transport = ScriptedTransport::new(vec![Step::ok_text("AquaPi runs on ESPHome.")]);
        let llm = client(transport.clone());
        let mut session = ChatSession::new();

        let outcome = send_message(&llm, &mut session, "What is AquaPi?", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(session.history.len(), 3);
        assert_eq!(session.history[2].role, Role::Model);
        assert_eq!(session.history[2].text, "AquaPi runs on ESPHome.");

        let sent = transport.requests();
        assert_eq!(sent[0].contents.len(), 2);
        assert!(sent[0].contents[1].parts[0].text.starts_with(PERSONA_PROMPT));
        assert!(sent[0].generation_config.is_none());
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let transport = ScriptedTransport::new(vec![Step::ok_text("unused")]);
        let llm = client(transport.clone());
        let mut session = ChatSession::new();

        let err = send_message(&llm, &mut session, "   ", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.history.len(), 1);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_suggestion_attaches_structured_answer() {
        let reply = json!({
            "title": "AquaPi vs Apex",
            "content": "### Overview",
            "followUps": ["Elaborate more about AquaPi vs. Apex Neptune", "Pricing?"]
        });
        let transport = ScriptedTransport::new(vec![Step::ok_text(&reply.to_string())]);
        let llm = client(transport.clone());
        let mut session = ChatSession::new();

        ask_suggestion(&llm, &mut session, "Compare AquaPi to Apex Neptune", &CancellationToken::new())
            .await
            .unwrap();

        let asked = session.last().unwrap();
        assert_eq!(asked.role, Role::User);
        match &asked.attachment {
            Some(Attachment::Suggestion(answer)) => {
                assert_eq!(answer.title, "AquaPi vs Apex");
                assert_eq!(answer.follow_ups.len(), 2);
            }
            other => panic!("unexpected attachment: {other:?}"),
        }
        let sent = transport.requests();
        assert!(sent[0].contents[0].parts[0].text.starts_with(PERSONA_PROMPT));
        assert!(sent[0].generation_config.is_some());
    }

    #[tokio::test]
    async fn test_suggestion_falls_back_to_raw_text() {
        let transport = ScriptedTransport::new(vec![Step::ok_text("Plain prose answer")]);
        let llm = client(transport);
        let mut session = ChatSession::new();

        ask_suggestion(&llm, &mut session, "What is AquaPi?", &CancellationToken::new())
            .await
            .unwrap();

        match &session.last().unwrap().attachment {
            Some(Attachment::Suggestion(answer)) => {
                assert_eq!(answer.title, "What is AquaPi?");
                assert!(answer.content.ends_with("Here is the raw text:\n\nPlain prose answer"));
                assert!(answer.follow_ups.is_empty());
            }
            other => panic!("unexpected attachment: {other:?}"),
        }
    }

    #[test]
    fn test_water_summary_and_readings() {
        let p = params(TempUnit::Fahrenheit, 77.0);
        assert_eq!(
            p.summary(),
            "Please analyze my water parameters for my Reef tank. Temp: 77°F, pH: 8.2, Salinity: 1.025 SG."
        );
        let readings = p.readings().unwrap();
        assert!(readings.contains("- Temperature: 25.00°C"));
        assert!(readings.contains("Specific Gravity (SG)"));
        assert!(!readings.contains("Additional Information"));
    }

    #[tokio::test]
    async fn test_water_analysis_keeps_display_temperature_in_prompt() {
        let reply = json!({
            "summary": { "status": "Good", "title": "Stable", "message": "All fine" },
            "parameters": [{
                "name": "Temperature", "value": "77°F", "idealRange": "76-80°F",
                "status": "Good", "advice": "Keep it steady"
            }],
            "howAquaPiHelps": "Continuous monitoring"
        });
        let transport = ScriptedTransport::new(vec![Step::ok_text(&reply.to_string())]);
        let llm = client(transport.clone());
        let mut session = ChatSession::new();

        analyze_water(&llm, &mut session, &params(TempUnit::Fahrenheit, 77.0), &CancellationToken::new())
            .await
            .unwrap();

        let prompt = &transport.requests()[0].contents[0].parts[0].text;
        assert!(prompt.contains("'77°F'"));
        assert!(prompt.contains("25.00°C"));
        match &session.last().unwrap().attachment {
            Some(Attachment::WaterAnalysis(a)) => {
                assert_eq!(a.summary.status, ParameterStatus::Good);
                assert_eq!(a.parameters.len(), 1);
            }
            other => panic!("unexpected attachment: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_water_analysis_parse_failure_posts_message() {
        let transport = ScriptedTransport::new(vec![Step::ok_text("not json")]);
        let llm = client(transport);
        let mut session = ChatSession::new();

        analyze_water(&llm, &mut session, &params(TempUnit::Celsius, 25.0), &CancellationToken::new())
            .await
            .unwrap();

        let last = session.last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text, ANALYSIS_FAILED_MESSAGE);
        assert!(session.history[1].attachment.is_none());
    }

    #[tokio::test]
    async fn test_automation_attaches_script() {
        let reply = json!({
            "title": "Automation for heater",
            "explanation": "Turns on the heater below 76°F",
            "code": "automation:\n  - alias: heater"
        });
        let transport = ScriptedTransport::new(vec![Step::ok_text(&reply.to_string())]);
        let llm = client(transport);
        let mut session = ChatSession::new();

        generate_automation(&llm, &mut session, "heater on below 76F", &CancellationToken::new())
            .await
            .unwrap();

        let asked = session.last().unwrap();
        assert_eq!(asked.text, "Generate an automation script for: \"heater on below 76F\"");
        assert!(matches!(asked.attachment, Some(Attachment::Automation(_))));
    }

    #[tokio::test]
    async fn test_automation_parse_failure_shows_raw_text() {
        let transport = ScriptedTransport::new(vec![Step::ok_text("alias: heater")]);
        let llm = client(transport);
        let mut session = ChatSession::new();

        generate_automation(&llm, &mut session, "heater", &CancellationToken::new())
            .await
            .unwrap();

        let last = session.last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text, format!("{SCRIPT_FAILED_PREFIX}alias: heater"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flow_leaves_one_error_message() {
        let transport = ScriptedTransport::new(vec![Step::status(503)]);
        let llm = client(transport);
        let mut session = ChatSession::new();

        let outcome = generate_automation(&llm, &mut session, "heater", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(session.history.len(), 3);
        assert!(!session.busy);
    }
}
