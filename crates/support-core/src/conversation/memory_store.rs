//! In-process conversation store (DashMap). Nothing survives a restart.

use super::{
    now_ms, ConversationError, ConversationRecord, ConversationStore, HandoffRecord, MessageRecord, Result,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryConversationStore {
    sessions: DashMap<String, Uuid>,
    conversations: DashMap<Uuid, ConversationRecord>,
    messages: DashMap<Uuid, Vec<MessageRecord>>,
    handoffs: DashMap<Uuid, Vec<HandoffRecord>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

impl ConversationStore for MemoryConversationStore {
    fn find_by_session(&self, session_id: &str) -> Result<Option<ConversationRecord>> {
        let found = self
            .sessions
            .get(session_id)
            .and_then(|id| self.conversations.get(id.value()).map(|c| c.value().clone()));
        Ok(found)
    }

    fn create_conversation(&self, conversation: &ConversationRecord) -> Result<()> {
        match self.sessions.entry(conversation.session_id.clone()) {
            Entry::Occupied(_) => Err(ConversationError::SessionExists(conversation.session_id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(conversation.id);
                self.conversations.insert(conversation.id, conversation.clone());
                Ok(())
            }
        }
    }

    fn append_message(&self, message: &MessageRecord) -> Result<()> {
        let mut conversation = self
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or(ConversationError::NotFound(message.conversation_id))?;
        conversation.updated_at_ms = now_ms();
        drop(conversation);
        self.messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    fn recent_messages(&self, conversation_id: Uuid, limit: usize) -> Result<Vec<MessageRecord>> {
        let Some(messages) = self.messages.get(&conversation_id) else {
            return Ok(Vec::new());
        };
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    fn record_handoff(&self, handoff: &HandoffRecord) -> Result<()> {
        self.handoffs
            .entry(handoff.conversation_id)
            .or_default()
            .push(handoff.clone());
        Ok(())
    }

    fn handoffs_for(&self, conversation_id: Uuid) -> Result<Vec<HandoffRecord>> {
        Ok(self
            .handoffs
            .get(&conversation_id)
            .map(|h| h.value().clone())
            .unwrap_or_default())
    }
}
