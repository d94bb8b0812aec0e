//! Fixed support knowledge base and its retrieval scorer.
//!
//! ## Default entries
//!
//! | # | Topic                  | Trigger terms                                             |
//! |---|------------------------|-----------------------------------------------------------|
//! | 1 | Order tracking         | track, order, shipping, package, delivery, where is       |
//! | 2 | Return policy          | return, refund, exchange, send back                       |
//! | 3 | Shipping time          | shipping, delivery, how long, arrive, when will           |
//! | 4 | Password reset         | password, reset, forgot, login, sign in, account          |
//! | 5 | International shipping | international, ship, country, overseas, abroad            |
//! | 6 | Payment methods        | payment, pay, credit card, paypal, accept                 |
//!
//! Order matters: the scorer keeps the first entry seen when two entries tie.

mod retrieval;

pub use retrieval::{RetrievalResult, CONFIDENCE_CAP, MATCH_THRESHOLD};

/// One topic in the knowledge base: a canonical question, its answer, and the
/// lowercase terms whose presence in a message counts towards a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub canonical_question: String,
    pub answer: String,
    pub trigger_terms: Vec<String>,
}

impl KnowledgeEntry {
    /// Builds an entry; trigger terms are lowercased.
    pub fn new<I, S>(canonical_question: impl Into<String>, answer: impl Into<String>, trigger_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            canonical_question: canonical_question.into(),
            answer: answer.into(),
            trigger_terms: trigger_terms
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
        }
    }
}

/// Immutable, ordered set of knowledge entries. Built once and shared read-only.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Knowledge base over a caller-supplied ordered set of entries.
    /// Entries without trigger terms are dropped since they can never match.
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|e| !e.trigger_terms.is_empty())
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(default_entries())
    }
}

pub const ORDER_TRACKING_QUESTION: &str = "How do I track my order?";
pub const RETURN_POLICY_QUESTION: &str = "What is your return policy?";
pub const SHIPPING_TIME_QUESTION: &str = "How long does shipping take?";
pub const PASSWORD_RESET_QUESTION: &str = "How do I reset my password?";
pub const INTERNATIONAL_SHIPPING_QUESTION: &str = "Do you ship internationally?";
pub const PAYMENT_METHODS_QUESTION: &str = "What payment methods do you accept?";

/// The built-in support topics, in their fixed order.
pub fn default_entries() -> Vec<KnowledgeEntry> {
    vec![
        KnowledgeEntry::new(
            ORDER_TRACKING_QUESTION,
            "I can help you track your order! Please provide your order number (it looks like ORD-12345).",
            ["track", "order", "shipping", "package", "delivery", "where is"],
        ),
        KnowledgeEntry::new(
            RETURN_POLICY_QUESTION,
            "We accept returns within 30 days of delivery. Items must be unused and in original packaging. To start a return, I'll need your order number.",
            ["return", "refund", "exchange", "send back"],
        ),
        KnowledgeEntry::new(
            SHIPPING_TIME_QUESTION,
            "Standard shipping takes 5-7 business days. Expedited shipping (2-3 days) is available at checkout. International orders typically take 10-14 business days.",
            ["shipping", "delivery", "how long", "arrive", "when will"],
        ),
        KnowledgeEntry::new(
            PASSWORD_RESET_QUESTION,
            "To reset your password, visit the login page and click 'Forgot Password'. You'll receive a reset link via email. If you don't see it, check your spam folder.",
            ["password", "reset", "forgot", "login", "sign in", "account"],
        ),
        KnowledgeEntry::new(
            INTERNATIONAL_SHIPPING_QUESTION,
            "Yes! We ship to most countries. Shipping costs and delivery times vary by location. You'll see the exact cost at checkout.",
            ["international", "ship", "country", "overseas", "abroad"],
        ),
        KnowledgeEntry::new(
            PAYMENT_METHODS_QUESTION,
            "We accept major credit cards (Visa, MasterCard, Amex), PayPal, and Apple Pay. All transactions are secure and encrypted.",
            ["payment", "pay", "credit card", "paypal", "accept"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_has_six_topics_in_fixed_order() {
        let kb = KnowledgeBase::default();
        let questions: Vec<&str> = kb
            .entries()
            .iter()
            .map(|e| e.canonical_question.as_str())
            .collect();
        assert_eq!(
            questions,
            vec![
                ORDER_TRACKING_QUESTION,
                RETURN_POLICY_QUESTION,
                SHIPPING_TIME_QUESTION,
                PASSWORD_RESET_QUESTION,
                INTERNATIONAL_SHIPPING_QUESTION,
                PAYMENT_METHODS_QUESTION,
            ]
        );
    }

    #[test]
    fn every_default_entry_has_lowercase_terms() {
        for entry in KnowledgeBase::default().entries() {
            assert!(!entry.trigger_terms.is_empty(), "{}", entry.canonical_question);
            for term in &entry.trigger_terms {
                assert_eq!(term, &term.to_lowercase());
            }
        }
    }

    #[test]
    fn new_lowercases_terms_and_drops_termless_entries() {
        let kb = KnowledgeBase::new(vec![
            KnowledgeEntry::new("Q1", "A1", ["Gift Card", "VOUCHER"]),
            KnowledgeEntry::new("Q2", "A2", Vec::<String>::new()),
        ]);
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.entries()[0].trigger_terms, vec!["gift card", "voucher"]);
    }

    #[test]
    fn password_entry_points_at_forgot_password() {
        let kb = KnowledgeBase::default();
        let entry = &kb.entries()[3];
        assert_eq!(entry.canonical_question, PASSWORD_RESET_QUESTION);
        assert!(entry.answer.contains("Forgot Password"));
    }
}
