//! Sled-backed conversation store with one tree per record kind.

use super::{
    now_ms, ConversationError, ConversationRecord, ConversationStore, HandoffRecord, MessageRecord, Result,
};
use sled::transaction::{abort, ConflictableTransactionResult, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;
use uuid::Uuid;

const CONVERSATIONS_TREE: &str = "conversations";
const SESSIONS_TREE: &str = "sessions";
const MESSAGES_TREE: &str = "messages";
const HANDOFFS_TREE: &str = "handoffs";

pub struct SledConversationStore {
    db: Db,
}

impl SledConversationStore {
    /// Opens or creates the store at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> std::result::Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree(&self, name: &str) -> Result<Tree> {
        Ok(self.db.open_tree(name)?)
    }

    fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRecord>> {
        let tree = self.tree(CONVERSATIONS_TREE)?;
        match tree.get(id.to_string().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn touch(&self, mut conversation: ConversationRecord) -> Result<()> {
        conversation.updated_at_ms = now_ms();
        let tree = self.tree(CONVERSATIONS_TREE)?;
        tree.insert(
            conversation.id.to_string().as_bytes(),
            serde_json::to_vec(&conversation)?,
        )?;
        Ok(())
    }

    /// Flushes dirty buffers to disk.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }
}

fn prefix(conversation_id: Uuid) -> String {
    format!("{}/", conversation_id)
}

impl ConversationStore for SledConversationStore {
    fn find_by_session(&self, session_id: &str) -> Result<Option<ConversationRecord>> {
        let sessions = self.tree(SESSIONS_TREE)?;
        let Some(id_bytes) = sessions.get(session_id.as_bytes())? else {
            return Ok(None);
        };
        let id = String::from_utf8_lossy(&id_bytes).to_string();
        let tree = self.tree(CONVERSATIONS_TREE)?;
        match tree.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn create_conversation(&self, conversation: &ConversationRecord) -> Result<()> {
        let sessions = self.tree(SESSIONS_TREE)?;
        let conversations = self.tree(CONVERSATIONS_TREE)?;
        let id = conversation.id.to_string();
        let session_key = conversation.session_id.as_bytes();
        let record = serde_json::to_vec(conversation)?;

        // Session claim and conversation record commit together. A claim
        // whose conversation is missing counts as free and is taken over.
        let outcome = (&sessions, &conversations).transaction(
            |(sessions, conversations)| -> ConflictableTransactionResult<(), ()> {
                if let Some(bound) = sessions.get(session_key)? {
                    if conversations.get(&bound)?.is_some() {
                        return abort(());
                    }
                }
                sessions.insert(session_key, id.as_bytes())?;
                conversations.insert(id.as_bytes(), record.as_slice())?;
                Ok(())
            },
        );
        match outcome {
            Ok(()) => {}
            Err(TransactionError::Abort(())) => {
                return Err(ConversationError::SessionExists(conversation.session_id.clone()));
            }
            Err(TransactionError::Storage(e)) => return Err(e.into()),
        }

        tracing::debug!(
            target: "support::store",
            session_id = %conversation.session_id,
            conversation_id = %id,
            "Conversation created"
        );
        Ok(())
    }

    fn append_message(&self, message: &MessageRecord) -> Result<()> {
        let conversation = self
            .get_conversation(message.conversation_id)?
            .ok_or(ConversationError::NotFound(message.conversation_id))?;
        // generate_id is monotonic across the whole db; zero-padding keeps keys sorted.
        let seq = self.db.generate_id()?;
        let key = format!("{}{:020}", prefix(message.conversation_id), seq);
        let tree = self.tree(MESSAGES_TREE)?;
        tree.insert(key.as_bytes(), serde_json::to_vec(message)?)?;
        self.touch(conversation)
    }

    fn recent_messages(&self, conversation_id: Uuid, limit: usize) -> Result<Vec<MessageRecord>> {
        let tree = self.tree(MESSAGES_TREE)?;
        let mut out = Vec::with_capacity(limit.min(64));
        for item in tree.scan_prefix(prefix(conversation_id).as_bytes()).rev().take(limit) {
            let (_, v) = item?;
            out.push(serde_json::from_slice::<MessageRecord>(&v)?);
        }
        out.reverse();
        Ok(out)
    }

    fn record_handoff(&self, handoff: &HandoffRecord) -> Result<()> {
        let seq = self.db.generate_id()?;
        let key = format!("{}{:020}", prefix(handoff.conversation_id), seq);
        let tree = self.tree(HANDOFFS_TREE)?;
        tree.insert(key.as_bytes(), serde_json::to_vec(handoff)?)?;
        Ok(())
    }

    fn handoffs_for(&self, conversation_id: Uuid) -> Result<Vec<HandoffRecord>> {
        let tree = self.tree(HANDOFFS_TREE)?;
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix(conversation_id).as_bytes()) {
            let (_, v) = item?;
            out.push(serde_json::from_slice::<HandoffRecord>(&v)?);
        }
        Ok(out)
    }
}
