//! Conversation records and the keyed store they live in.
//!
//! | Record              | Key                                  |
//! |---------------------|--------------------------------------|
//! | ConversationRecord  | conversation id (session id indexed) |
//! | MessageRecord       | `{conversation_id}/{seq}`            |
//! | HandoffRecord       | `{conversation_id}/{handoff_id}`     |

mod memory_store;
mod sled_store;

pub use memory_store::MemoryConversationStore;
pub use sled_store::SledConversationStore;

use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_CHANNEL: &str = "web";
pub const STATUS_OPEN: &str = "open";
pub const HANDOFF_PENDING: &str = "pending";

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("session already exists: {0}")]
    SessionExists(String),

    #[error("conversation not found: {0}")]
    NotFound(Uuid),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("corrupt record: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConversationError>;

/// Unix timestamp in milliseconds.
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub session_id: String,
    pub channel: String,
    #[serde(default)]
    pub locale: Option<String>,
    pub status: String,
    pub started_at_ms: i64,
    pub updated_at_ms: i64,
}

impl ConversationRecord {
    pub fn new(session_id: impl Into<String>, locale: Option<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            channel: DEFAULT_CHANNEL.to_string(),
            locale,
            status: STATUS_OPEN.to_string(),
            started_at_ms: now,
            updated_at_ms: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Retrieval confidence (0–95) when the reply came from the knowledge base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_value: Option<String>,
    pub created_at_ms: i64,
}

impl MessageRecord {
    pub fn new(conversation_id: Uuid, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.into(),
            intent: None,
            confidence: None,
            extracted_value: None,
            created_at_ms: now_ms(),
        }
    }

    pub fn with_intent(mut self, intent: Intent, extracted_value: Option<String>) -> Self {
        self.intent = Some(intent);
        self.extracted_value = extracted_value;
        self
    }

    pub fn with_confidence(mut self, confidence: Option<u8>) -> Self {
        self.confidence = confidence;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub recommended: bool,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: String,
    /// Ticket in the external helpdesk, once one has been opened.
    #[serde(default)]
    pub ticket_id: Option<String>,
    pub created_at_ms: i64,
}

impl HandoffRecord {
    pub fn pending(conversation_id: Uuid, recommended: bool, reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            recommended,
            reason,
            status: HANDOFF_PENDING.to_string(),
            ticket_id: None,
            created_at_ms: now_ms(),
        }
    }
}

/// Keyed record store for conversations, their messages and handoffs.
pub trait ConversationStore: Send + Sync {
    /// Conversation bound to `session_id`, if one exists.
    fn find_by_session(&self, session_id: &str) -> Result<Option<ConversationRecord>>;

    /// Persists a new conversation. Fails with [`ConversationError::SessionExists`]
    /// when its session id is already taken.
    fn create_conversation(&self, conversation: &ConversationRecord) -> Result<()>;

    /// Appends a message; messages of a conversation keep insertion order.
    fn append_message(&self, message: &MessageRecord) -> Result<()>;

    /// The last `limit` messages of a conversation, oldest first.
    fn recent_messages(&self, conversation_id: Uuid, limit: usize) -> Result<Vec<MessageRecord>>;

    fn record_handoff(&self, handoff: &HandoffRecord) -> Result<()>;

    fn handoffs_for(&self, conversation_id: Uuid) -> Result<Vec<HandoffRecord>>;
}
