//! Conversation history for one practice session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Learner,
    Assistant,
}

/// One attributed utterance
///
/// Fields are private so a turn cannot change once it is in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    speaker: Speaker,
    text: String,
    at: DateTime<Utc>,
}

impl Turn {
    /// A turn spoken by the learner
    pub fn learner(text: impl Into<String>) -> Self {
        Self::new(Speaker::Learner, text)
    }

    /// A turn spoken by the assistant
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn speaker(&self) -> Speaker {
        self.speaker
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the turn was recorded
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Append-only, insertion-ordered log of turns
///
/// No removal, editing, deduplication or size cap.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn at the end
    pub fn append(&mut self, turn: Turn) {
        tracing::trace!(speaker = ?turn.speaker, len = self.turns.len() + 1, "turn appended");
        self.turns.push(turn);
    }

    /// Read-only view in conversation order
    #[must_use]
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent turn, if any
    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_preserves_insertion_order() {
        let mut history = ConversationHistory::new();
        let t1 = Turn::learner("wed");
        let t2 = Turn::assistant("Almost! Try red.");
        history.append(t1.clone());
        history.append(t2.clone());
        assert_eq!(history.snapshot(), [t1, t2]);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut history = ConversationHistory::new();
        let t = Turn::learner("hello");
        history.append(t.clone());
        history.append(t.clone());
        assert_eq!(history.len(), 2);
        assert_eq!(history.last(), Some(&t));
    }

    #[test]
    fn turn_serializes_with_lowercase_speaker() {
        let json = serde_json::to_value(Turn::assistant("Hi!")).unwrap();
        assert_eq!(json["speaker"], "assistant");
        assert_eq!(json["text"], "Hi!");
    }
}
