//! Dispatch of one generative call against a chat session.
//!
//! `dispatch` is the only place chat flows talk to `LlmClient`. It owns the
//! busy flag and turns failures into exactly one model message; a cancelled
//! call leaves the history untouched.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chat::models::{ChatSession, Role};
use crate::llm_client::{GenerateContentRequest, LlmClient, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered,
    Failed,
    Cancelled,
}

/// Sends `request` and hands the reply text to `on_success` exactly once.
///
/// `session.busy` is set before the first attempt and cleared once the call
/// settles, whatever the outcome.
pub async fn dispatch<F>(
    llm: &LlmClient,
    session: &mut ChatSession,
    request: &GenerateContentRequest,
    cancel: &CancellationToken,
    on_success: F,
) -> DispatchOutcome
where
    F: FnOnce(&mut ChatSession, String),
{
    session.busy = true;

    let outcome = match llm.call(request, cancel).await {
        Ok(text) => {
            on_success(session, text);
            DispatchOutcome::Delivered
        }
        Err(LlmError::Cancelled) => {
            info!("Chat request cancelled");
            DispatchOutcome::Cancelled
        }
        Err(e) => {
            warn!("Chat request failed: {e}");
            if let Some(message) = e.user_message() {
                session.push(Role::Model, message);
            }
            DispatchOutcome::Failed
        }
    };

    session.busy = false;
    outcome
}
