//! Assistant façade: the three call-level operations over one knowledge base,
//! plus session-scoped turn handling on top of a [`ConversationStore`].
//!
//! [`ConversationStore`]: crate::conversation::ConversationStore

mod turn;

pub use turn::{TurnOutcome, TurnRequest};

use crate::intent::{self, Intent, IntentMatch};
use crate::knowledge::{KnowledgeBase, RetrievalResult};
use crate::policy::{self, DialogueTurn};
use std::sync::Arc;

/// Stateless entry point. Cheap to clone; the knowledge base is shared.
#[derive(Debug, Clone)]
pub struct Assistant {
    knowledge: Arc<KnowledgeBase>,
}

impl Assistant {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Best knowledge entry for `message`, if any clears the confidence threshold.
    pub fn find_best_match(&self, message: &str) -> Option<RetrievalResult<'_>> {
        self.knowledge.find_best_match(message)
    }

    pub fn classify_intent(&self, message: &str) -> IntentMatch {
        intent::classify(message)
    }

    pub fn generate_reply(&self, message: &str, intent: Intent) -> DialogueTurn {
        policy::respond(&self.knowledge, message, intent)
    }
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new(Arc::new(KnowledgeBase::default()))
    }
}
