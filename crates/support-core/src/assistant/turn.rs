//! One conversation turn: resolve the session, classify, reply, persist.

use super::Assistant;
use crate::conversation::{
    ConversationError, ConversationRecord, ConversationStore, HandoffRecord, MessageRecord, Role,
};
use crate::intent::IntentMatch;
use crate::policy::{Handoff, ReplySource};
use uuid::Uuid;

/// Inbound user message with its optional session binding.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub message: String,
    pub session_id: Option<String>,
    /// Only used when the turn opens a new conversation.
    pub locale: Option<String>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub conversation_id: Uuid,
    pub session_id: String,
    pub reply: String,
    pub intent: IntentMatch,
    /// Most recent messages of the conversation, oldest first, this turn included.
    pub messages: Vec<MessageRecord>,
    pub handoff: Option<Handoff>,
}

fn new_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}

impl Assistant {
    fn resolve_conversation(
        &self,
        store: &dyn ConversationStore,
        request: &TurnRequest,
    ) -> Result<ConversationRecord, ConversationError> {
        let session_id = match request.session_id.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(sid) => {
                if let Some(existing) = store.find_by_session(sid)? {
                    return Ok(existing);
                }
                sid.to_string()
            }
            None => new_session_id(),
        };

        let conversation = ConversationRecord::new(session_id, request.locale.clone());
        match store.create_conversation(&conversation) {
            Ok(()) => {
                tracing::info!(
                    target: "support::turn",
                    session_id = %conversation.session_id,
                    "Created new conversation"
                );
                Ok(conversation)
            }
            // Lost a race with a concurrent first turn on the same session.
            Err(ConversationError::SessionExists(sid)) => store
                .find_by_session(&sid)?
                .ok_or(ConversationError::SessionExists(sid)),
            Err(e) => Err(e),
        }
    }

    /// Runs a full turn against `store` and returns the reply with the last
    /// `history_limit` messages of the conversation.
    pub fn handle_turn(
        &self,
        store: &dyn ConversationStore,
        request: &TurnRequest,
        history_limit: usize,
    ) -> Result<TurnOutcome, ConversationError> {
        // Whitespace-only messages are valid input and get the capability menu.
        if request.message.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let conversation = self.resolve_conversation(store, request)?;

        let intent = self.classify_intent(&request.message);
        tracing::info!(
            target: "support::turn",
            intent = %intent.intent,
            extracted = ?intent.entity,
            "Intent detected"
        );

        let user_message = MessageRecord::new(conversation.id, Role::User, request.message.clone())
            .with_intent(intent.intent, intent.entity.clone());
        store.append_message(&user_message)?;

        let turn = self.generate_reply(&request.message, intent.intent);
        let confidence = match turn.source {
            ReplySource::Knowledge { confidence } => Some(confidence.round() as u8),
            _ => None,
        };
        let assistant_message = MessageRecord::new(conversation.id, Role::Assistant, turn.reply_text.clone())
            .with_confidence(confidence);
        store.append_message(&assistant_message)?;

        if turn.handoff_recommended() {
            let record = HandoffRecord::pending(conversation.id, true, turn.handoff_reason().map(str::to_string));
            store.record_handoff(&record)?;
            tracing::info!(
                target: "support::turn",
                session_id = %conversation.session_id,
                reason = ?record.reason,
                "Handoff recorded"
            );
        }

        let messages = store.recent_messages(conversation.id, history_limit)?;

        Ok(TurnOutcome {
            conversation_id: conversation.id,
            session_id: conversation.session_id,
            reply: turn.reply_text,
            intent,
            messages,
            handoff: turn.handoff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{MemoryConversationStore, HANDOFF_PENDING};
    use crate::intent::Intent;
    use crate::policy::{CAPABILITY_MENU_REPLY, ESCALATION_REASON};

    #[test]
    fn first_turn_creates_session() {
        let assistant = Assistant::default();
        let store = MemoryConversationStore::new();
        let out = assistant
            .handle_turn(&store, &TurnRequest::new("Where is my order?"), 10)
            .unwrap();
        assert!(out.session_id.starts_with("sess_"));
        assert_eq!(out.session_id.len(), "sess_".len() + 32);
        assert!(!out.reply.is_empty());
        assert_eq!(out.messages.len(), 2);
        assert_eq!(out.messages[0].role, Role::User);
        assert_eq!(out.messages[0].intent, Some(Intent::OrderTracking));
        assert_eq!(out.messages[1].role, Role::Assistant);
        assert!(out.handoff.is_none());
    }

    #[test]
    fn session_is_preserved_across_turns() {
        let assistant = Assistant::default();
        let store = MemoryConversationStore::new();
        let first = assistant
            .handle_turn(&store, &TurnRequest::new("Hello"), 10)
            .unwrap();
        let second = assistant
            .handle_turn(
                &store,
                &TurnRequest::new("Track my order").with_session(first.session_id.clone()),
                10,
            )
            .unwrap();
        assert_eq!(second.session_id, first.session_id);
        assert_eq!(second.conversation_id, first.conversation_id);
        assert_eq!(second.messages.len(), 4);
        assert_eq!(second.messages[2].content, "Track my order");
        assert_eq!(store.conversation_count(), 1);
    }

    #[test]
    fn unknown_session_id_is_adopted() {
        let assistant = Assistant::default();
        let store = MemoryConversationStore::new();
        let out = assistant
            .handle_turn(
                &store,
                &TurnRequest::new("hi").with_session("client-chosen").with_locale("fr-FR"),
                10,
            )
            .unwrap();
        assert_eq!(out.session_id, "client-chosen");
        let conv = store.find_by_session("client-chosen").unwrap().unwrap();
        assert_eq!(conv.locale.as_deref(), Some("fr-FR"));
    }

    #[test]
    fn escalation_records_pending_handoff() {
        let assistant = Assistant::default();
        let store = MemoryConversationStore::new();
        let out = assistant
            .handle_turn(&store, &TurnRequest::new("I need to speak with an agent"), 10)
            .unwrap();
        let handoff = out.handoff.expect("handoff");
        assert!(handoff.recommended);
        assert_eq!(handoff.reason.as_deref(), Some(ESCALATION_REASON));
        let stored = store.handoffs_for(out.conversation_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, HANDOFF_PENDING);
    }

    #[test]
    fn entity_and_confidence_are_stored() {
        let assistant = Assistant::default();
        let store = MemoryConversationStore::new();
        let out = assistant
            .handle_turn(&store, &TurnRequest::new("Track my order ORD-12345"), 10)
            .unwrap();
        assert_eq!(out.intent.entity.as_deref(), Some("ORD-12345"));
        assert_eq!(out.messages[0].extracted_value.as_deref(), Some("ORD-12345"));
        // "track" + "order" over 6 tracking terms.
        assert_eq!(out.messages[1].confidence, Some(33));

        let faq = assistant
            .handle_turn(&store, &TurnRequest::new("hello"), 10)
            .unwrap();
        assert_eq!(faq.messages[1].confidence, None);
    }

    #[test]
    fn history_is_limited_to_latest_messages() {
        let assistant = Assistant::default();
        let store = MemoryConversationStore::new();
        let first = assistant
            .handle_turn(&store, &TurnRequest::new("turn 0"), 3)
            .unwrap();
        let mut last = first.clone();
        for i in 1..4 {
            last = assistant
                .handle_turn(
                    &store,
                    &TurnRequest::new(format!("turn {}", i)).with_session(first.session_id.clone()),
                    3,
                )
                .unwrap();
        }
        assert_eq!(last.messages.len(), 3);
        assert_eq!(last.messages[1].content, "turn 3");
        assert_eq!(last.messages[2].role, Role::Assistant);
    }

    #[test]
    fn empty_message_is_rejected() {
        let assistant = Assistant::default();
        let store = MemoryConversationStore::new();
        assert!(matches!(
            assistant.handle_turn(&store, &TurnRequest::new(""), 10),
            Err(ConversationError::EmptyMessage)
        ));
        assert_eq!(store.conversation_count(), 0);
    }

    #[test]
    fn whitespace_message_gets_capability_menu() {
        let assistant = Assistant::default();
        let store = MemoryConversationStore::new();
        let out = assistant
            .handle_turn(&store, &TurnRequest::new("  \n"), 10)
            .unwrap();
        assert_eq!(out.reply, CAPABILITY_MENU_REPLY);
        assert_eq!(out.intent.intent, Intent::Faq);
        assert_eq!(out.messages.len(), 2);
        assert_eq!(out.messages[0].content, "  \n");
        assert_eq!(store.conversation_count(), 1);
    }
}
