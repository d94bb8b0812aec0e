//! Rule-based intent classification.
//!
//! Rules are checked in priority order and the first hit wins:
//! order tracking, returns, escalation, then the FAQ fallback.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Order identifiers: `ORD-<digits>`, `#` followed by 5+ digits, or a bare run of 10+ digits.
static ORDER_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bORD-\d+\b|#\d{5,}\b|\b\d{10,}\b").expect("order id pattern is valid")
});

const ORDER_TRACKING_PHRASES: [&str; 3] = ["track", "where is my order", "order status"];
const RETURNS_PHRASES: [&str; 4] = ["return", "refund", "send back", "exchange"];
const ESCALATION_PHRASES: [&str; 5] = ["agent", "human", "representative", "person", "speak to"];

/// Coarse category of what the user needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    OrderTracking,
    Returns,
    Escalation,
    Faq,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderTracking => "order_tracking",
            Self::Returns => "returns",
            Self::Escalation => "escalation",
            Self::Faq => "faq",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified intent plus the entity pulled from the message, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub intent: Intent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl IntentMatch {
    fn bare(intent: Intent) -> Self {
        Self { intent, entity: None }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// First order identifier in `message`, exactly as written.
pub fn extract_order_id(message: &str) -> Option<&str> {
    ORDER_ID_RE.find(message).map(|m| m.as_str())
}

/// Classifies a single message. Total: every input yields exactly one intent.
pub fn classify(message: &str) -> IntentMatch {
    let lower = message.to_lowercase();

    let order_id = extract_order_id(message);
    if order_id.is_some() || contains_any(&lower, &ORDER_TRACKING_PHRASES) {
        return IntentMatch {
            intent: Intent::OrderTracking,
            entity: order_id.map(str::to_string),
        };
    }

    if contains_any(&lower, &RETURNS_PHRASES) {
        return IntentMatch::bare(Intent::Returns);
    }

    if contains_any(&lower, &ESCALATION_PHRASES) {
        return IntentMatch::bare(Intent::Escalation);
    }

    IntentMatch::bare(Intent::Faq)
}
