//! support-core: intent classification, knowledge retrieval and dialogue policy
//! for the support assistant, plus the conversation store the gateway persists turns to.

mod assistant;
mod conversation;
mod intent;
mod knowledge;
mod policy;
mod shared;

pub use shared::{CoreConfig, StorageBackend, DEFAULT_HISTORY_LIMIT};

pub use knowledge::{
    default_entries, KnowledgeBase, KnowledgeEntry, RetrievalResult, CONFIDENCE_CAP, INTERNATIONAL_SHIPPING_QUESTION,
    MATCH_THRESHOLD, ORDER_TRACKING_QUESTION, PASSWORD_RESET_QUESTION, PAYMENT_METHODS_QUESTION,
    RETURN_POLICY_QUESTION, SHIPPING_TIME_QUESTION,
};

pub use intent::{classify, extract_order_id, Intent, IntentMatch};

pub use policy::{
    respond, DialogueTurn, Handoff, ReplySource, CAPABILITY_MENU_REPLY, ESCALATION_REASON, ESCALATION_REPLY,
    ORDER_NUMBER_REPLY, RETURNS_INTAKE_REPLY,
};

pub use conversation::{
    ConversationError, ConversationRecord, ConversationStore, HandoffRecord, MemoryConversationStore, MessageRecord,
    Role, SledConversationStore, DEFAULT_CHANNEL, HANDOFF_PENDING, STATUS_OPEN,
};

pub use assistant::{Assistant, TurnOutcome, TurnRequest};
