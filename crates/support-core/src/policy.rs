//! Dialogue policy: turns a message and its intent into a reply and an
//! optional recommendation to hand the conversation to a human.

use crate::intent::Intent;
use crate::knowledge::KnowledgeBase;

pub const ESCALATION_REPLY: &str =
    "I'll connect you with a support agent. Please provide your email and a brief description of your issue.";

pub const ESCALATION_REASON: &str = "User requested human assistance";

pub const ORDER_NUMBER_REPLY: &str =
    "I can help you track your order. Please provide your order number (format: ORD-12345).";

pub const RETURNS_INTAKE_REPLY: &str =
    "I can help with returns. Could you provide your order number so I can look up the details?";

pub const CAPABILITY_MENU_REPLY: &str = "I'd be happy to help! Could you provide a bit more detail? I can assist with:\n\
• Order tracking\n\
• Returns & refunds\n\
• Shipping info\n\
• Account questions\n\n\
Or type 'agent' to speak with a person.";

/// Recommendation that a human agent take over the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub recommended: bool,
    pub reason: Option<String>,
}

impl Handoff {
    pub fn recommended(reason: impl Into<String>) -> Self {
        Self {
            recommended: true,
            reason: Some(reason.into()),
        }
    }
}

/// Where the reply text came from. Lets callers log and store retrieval confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplySource {
    Escalation,
    Knowledge { confidence: f64 },
    OrderNumberRequest,
    ReturnsIntake,
    CapabilityMenu,
}

/// Reply produced for one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueTurn {
    pub reply_text: String,
    pub handoff: Option<Handoff>,
    pub source: ReplySource,
}

impl DialogueTurn {
    fn fixed(reply: &str, source: ReplySource) -> Self {
        Self {
            reply_text: reply.to_string(),
            handoff: None,
            source,
        }
    }

    pub fn handoff_recommended(&self) -> bool {
        self.handoff.as_ref().is_some_and(|h| h.recommended)
    }

    pub fn handoff_reason(&self) -> Option<&str> {
        self.handoff.as_ref().and_then(|h| h.reason.as_deref())
    }
}

/// Chooses the reply for `message` given its already-classified `intent`.
///
/// Escalation is decided before retrieval, so an explicit request for a human
/// always wins over a knowledge match.
pub fn respond(knowledge: &KnowledgeBase, message: &str, intent: Intent) -> DialogueTurn {
    if intent == Intent::Escalation {
        return DialogueTurn {
            reply_text: ESCALATION_REPLY.to_string(),
            handoff: Some(Handoff::recommended(ESCALATION_REASON)),
            source: ReplySource::Escalation,
        };
    }

    if let Some(hit) = knowledge.find_best_match(message) {
        tracing::debug!(
            target: "support::policy",
            question = %hit.entry.canonical_question,
            confidence = hit.confidence,
            "Knowledge match"
        );
        return DialogueTurn {
            reply_text: hit.answer().to_string(),
            handoff: None,
            source: ReplySource::Knowledge {
                confidence: hit.confidence,
            },
        };
    }

    match intent {
        Intent::OrderTracking => DialogueTurn::fixed(ORDER_NUMBER_REPLY, ReplySource::OrderNumberRequest),
        Intent::Returns => DialogueTurn::fixed(RETURNS_INTAKE_REPLY, ReplySource::ReturnsIntake),
        Intent::Escalation | Intent::Faq => {
            DialogueTurn::fixed(CAPABILITY_MENU_REPLY, ReplySource::CapabilityMenu)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{KnowledgeEntry, SHIPPING_TIME_QUESTION};

    #[test]
    fn escalation_recommends_handoff() {
        let kb = KnowledgeBase::default();
        let turn = respond(&kb, "I need to speak with an agent", Intent::Escalation);
        assert_eq!(turn.reply_text, ESCALATION_REPLY);
        assert!(turn.handoff_recommended());
        assert_eq!(turn.handoff_reason(), Some(ESCALATION_REASON));
        assert_eq!(turn.source, ReplySource::Escalation);
    }

    #[test]
    fn escalation_wins_over_knowledge_match() {
        let kb = KnowledgeBase::new(vec![KnowledgeEntry::new(
            "Can I talk to an agent?",
            "Agents are available 9-5.",
            ["agent"],
        )]);
        assert!(kb.find_best_match("I need to speak with an agent").is_some());
        let turn = respond(&kb, "I need to speak with an agent", Intent::Escalation);
        assert_eq!(turn.reply_text, ESCALATION_REPLY);
        assert!(turn.handoff_recommended());
    }

    #[test]
    fn faq_returns_knowledge_answer_verbatim() {
        let kb = KnowledgeBase::default();
        let turn = respond(&kb, "How long does shipping take?", Intent::Faq);
        let expected = kb
            .entries()
            .iter()
            .find(|e| e.canonical_question == SHIPPING_TIME_QUESTION)
            .map(|e| e.answer.as_str());
        assert_eq!(Some(turn.reply_text.as_str()), expected);
        assert!(turn.handoff.is_none());
        assert!(matches!(turn.source, ReplySource::Knowledge { confidence } if (confidence - 60.0).abs() < 1e-9));
    }

    #[test]
    fn knowledge_match_beats_intent_fallback() {
        let kb = KnowledgeBase::default();
        // Returns intent, but the return-policy entry matches first.
        let turn = respond(&kb, "I need a refund", Intent::Returns);
        assert!(turn.reply_text.starts_with("We accept returns within 30 days"));
    }

    #[test]
    fn order_tracking_without_match_asks_for_number() {
        let kb = KnowledgeBase::new(vec![KnowledgeEntry::new("Q", "A", ["nothing here"])]);
        let turn = respond(&kb, "ORD-12345", Intent::OrderTracking);
        assert_eq!(turn.reply_text, ORDER_NUMBER_REPLY);
        assert!(turn.handoff.is_none());
    }

    #[test]
    fn returns_without_match_asks_for_details() {
        let kb = KnowledgeBase::new(Vec::new());
        let turn = respond(&kb, "I want a refund", Intent::Returns);
        assert_eq!(turn.reply_text, RETURNS_INTAKE_REPLY);
        assert!(turn.handoff.is_none());
    }

    #[test]
    fn unmatched_faq_lists_capabilities() {
        let kb = KnowledgeBase::default();
        for msg in ["hello", "", "   ", "\u{1F600}"] {
            let turn = respond(&kb, msg, Intent::Faq);
            assert_eq!(turn.reply_text, CAPABILITY_MENU_REPLY);
            assert!(turn.handoff.is_none());
        }
        for topic in ["Order tracking", "Returns & refunds", "Shipping info", "Account questions", "'agent'"] {
            assert!(CAPABILITY_MENU_REPLY.contains(topic), "{}", topic);
        }
    }

    #[test]
    fn respond_is_idempotent() {
        let kb = KnowledgeBase::default();
        let a = respond(&kb, "What payment methods do you accept?", Intent::Faq);
        let b = respond(&kb, "What payment methods do you accept?", Intent::Faq);
        assert_eq!(a, b);
    }
}
