//! Chat handler: one user message in, the assistant's reply plus recent
//! history and any handoff recommendation out.
//!
//! Turn processing touches the conversation store (Sled does blocking I/O),
//! so it runs on the blocking pool.

use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use support_core::{ConversationError, MessageRecord, Role, TurnOutcome, TurnRequest};

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUser {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) is_authenticated: bool,
}

/// Chat request from the web widget.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) session_id: Option<String>,
    #[serde(default)]
    pub(crate) user: Option<ChatUser>,
    /// Free-form client metadata. `locale` is kept on new conversations.
    #[serde(default)]
    pub(crate) metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub(crate) role: Role,
    pub(crate) content: String,
    /// Unix timestamp (milliseconds).
    pub(crate) timestamp: i64,
}

impl From<MessageRecord> for ChatMessage {
    fn from(m: MessageRecord) -> Self {
        Self {
            role: m.role,
            content: m.content,
            timestamp: m.created_at_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HandoffBody {
    pub(crate) recommended: bool,
    pub(crate) reason: Option<String>,
    pub(crate) ticket_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatResponse {
    pub(crate) session_id: String,
    pub(crate) reply: String,
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) handoff: Option<HandoffBody>,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(out: TurnOutcome) -> Self {
        Self {
            session_id: out.session_id,
            reply: out.reply,
            messages: out.messages.into_iter().map(ChatMessage::from).collect(),
            handoff: out.handoff.map(|h| HandoffBody {
                recommended: h.recommended,
                reason: h.reason,
                ticket_id: None,
            }),
        }
    }
}

impl ChatRequest {
    fn locale(&self) -> Option<String> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("locale"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn into_turn(self) -> TurnRequest {
        let locale = self.locale();
        TurnRequest {
            message: self.message,
            session_id: self.session_id,
            locale,
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// POST /api/v1/chat – process a chat message and return the bot response.
///
/// Body rejections (malformed JSON, missing `message`) keep axum's status
/// code but are reported in the same `{"error": ...}` shape as turn errors.
pub(crate) async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!(target: "support::gateway", error = %rejection.body_text(), "Chat request rejected");
            return error_response(rejection.status(), &rejection.body_text());
        }
    };

    tracing::info!(
        target: "support::gateway",
        chars = req.message.chars().count(),
        has_session = req.session_id.is_some(),
        authenticated = req.user.as_ref().is_some_and(|u| u.is_authenticated),
        user_id = ?req.user.as_ref().and_then(|u| u.id.as_deref()),
        "Chat request received"
    );

    let assistant = state.assistant.clone();
    let store = state.store.clone();
    let history_limit = state.config.history_limit;
    let turn = req.into_turn();

    let result = tokio::task::spawn_blocking(move || assistant.handle_turn(store.as_ref(), &turn, history_limit)).await;

    match result {
        Ok(Ok(outcome)) => axum::Json(ChatResponse::from(outcome)).into_response(),
        Ok(Err(ConversationError::EmptyMessage)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "message must not be empty")
        }
        Ok(Err(e)) => {
            tracing::error!(target: "support::gateway", error = %e, "Error processing chat");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        Err(e) => {
            tracing::error!(target: "support::gateway", error = %e, "Chat task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
