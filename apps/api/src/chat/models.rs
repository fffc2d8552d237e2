use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm_client::prompts::{with_persona, WELCOME_MESSAGE};
use crate::llm_client::Content;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

// ────────────────────────────────────────────────────────────────────────────
// Structured answers attached to messages
// ────────────────────────────────────────────────────────────────────────────

/// Answer to one of the suggested questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionAnswer {
    pub title: String,
    pub content: String,
    #[serde(default, alias = "followUps")]
    pub follow_ups: Vec<String>,
}

impl SuggestionAnswer {
    /// Used when the model reply is not the JSON we asked for.
    pub fn fallback(question: &str, raw: &str) -> Self {
        Self {
            title: question.to_string(),
            content: format!(
                "Sorry, I couldn't generate a structured response. Here is the raw text:\n\n{raw}"
            ),
            follow_ups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterStatus {
    Good,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    Bad,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub status: ParameterStatus,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterReading {
    pub name: String,
    pub value: String,
    #[serde(alias = "idealRange")]
    pub ideal_range: String,
    pub status: ParameterStatus,
    pub advice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterAnalysis {
    pub summary: AnalysisSummary,
    #[serde(default)]
    pub parameters: Vec<ParameterReading>,
    #[serde(default, alias = "howAquaPiHelps")]
    pub how_aquapi_helps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationScript {
    pub title: String,
    pub explanation: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    Suggestion(SuggestionAnswer),
    WaterAnalysis(WaterAnalysis),
    Automation(AutomationScript),
}

// ────────────────────────────────────────────────────────────────────────────
// Conversation state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            attachment: None,
            created_at: Utc::now(),
        }
    }
}

/// Everything the chat view needs, passed into each handler and returned from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// True only while a generative call is in flight.
    #[serde(default)]
    pub busy: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// A fresh session opened by the welcome message.
    pub fn new() -> Self {
        Self {
            history: vec![ChatMessage::new(Role::Model, WELCOME_MESSAGE)],
            busy: false,
        }
    }

    /// Appends a message and returns its id.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> Uuid {
        let message = ChatMessage::new(role, text);
        let id = message.id;
        self.history.push(message);
        id
    }

    /// Attaches a structured answer to the message with `id`. Returns false if
    /// the message is gone.
    pub fn attach(&mut self, id: Uuid, attachment: Attachment) -> bool {
        match self.history.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.attachment = Some(attachment);
                true
            }
            None => false,
        }
    }

    /// The conversation as request contents, persona prepended to the first user turn.
    pub fn to_contents(&self) -> Vec<Content> {
        let first_user = self.history.iter().position(|m| m.role == Role::User);
        self.history
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                let text = if Some(idx) == first_user {
                    with_persona(&message.text)
                } else {
                    message.text.clone()
                };
                match message.role {
                    Role::User => Content::user(text),
                    Role::Model => Content::model(text),
                }
            })
            .collect()
    }
}

#[cfg(test)]
impl ChatSession {
    pub fn last(&self) -> Option<&ChatMessage> {
        self.history.last()
    }
}
