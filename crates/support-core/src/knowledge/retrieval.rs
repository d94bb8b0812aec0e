//! Trigger-term retrieval over the knowledge base.
//!
//! Matching is plain substring containment on the lowercased message, so a term
//! also matches inside a longer word ("return" scores for "returnable").

use super::{KnowledgeBase, KnowledgeEntry};

/// Normalized score an entry must strictly exceed to be returned.
pub const MATCH_THRESHOLD: f64 = 0.15;

/// Upper bound for reported confidence; keyword matching never claims certainty.
pub const CONFIDENCE_CAP: f64 = 95.0;

/// Best knowledge entry for a message, borrowed from the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalResult<'kb> {
    pub entry: &'kb KnowledgeEntry,
    /// Match strength in `[0, 95]`.
    pub confidence: f64,
}

impl RetrievalResult<'_> {
    pub fn answer(&self) -> &str {
        &self.entry.answer
    }
}

impl KnowledgeEntry {
    /// Sum of word counts of every trigger term found in `message_lower`,
    /// divided by the total number of trigger terms of this entry.
    pub fn normalized_score(&self, message_lower: &str) -> f64 {
        if self.trigger_terms.is_empty() {
            return 0.0;
        }
        let raw: usize = self
            .trigger_terms
            .iter()
            .filter(|term| message_lower.contains(term.as_str()))
            .map(|term| term.split_whitespace().count())
            .sum();
        raw as f64 / self.trigger_terms.len() as f64
    }
}

impl KnowledgeBase {
    /// Scores every entry against `message` and returns the best one above
    /// [`MATCH_THRESHOLD`]. Ties keep the entry that comes first.
    pub fn find_best_match(&self, message: &str) -> Option<RetrievalResult<'_>> {
        let message_lower = message.to_lowercase();

        let mut best: Option<(&KnowledgeEntry, f64)> = None;
        for entry in &self.entries {
            let score = entry.normalized_score(&message_lower);
            let best_score = best.map(|(_, s)| s).unwrap_or(0.0);
            if score > best_score {
                best = Some((entry, score));
            }
        }

        let (entry, score) = best?;
        if score > MATCH_THRESHOLD {
            Some(RetrievalResult {
                entry,
                confidence: (score * 100.0).min(CONFIDENCE_CAP),
            })
        } else {
            None
        }
    }
}
