//! Ordered queue of target words for a practice session

use std::collections::VecDeque;

use crate::phonetics::{Category, PhoneticDictionary, WordEntry};
use crate::{Error, Result};

/// Target words still to practice, front first
#[derive(Debug, Clone, Default)]
pub struct LessonPlan {
    pending: VecDeque<WordEntry>,
    completed: Vec<String>,
}

impl LessonPlan {
    pub fn new(words: impl IntoIterator<Item = WordEntry>) -> Self {
        Self {
            pending: words.into_iter().collect(),
            completed: Vec::new(),
        }
    }

    /// Build a plan from spelled words
    ///
    /// # Errors
    ///
    /// Returns a dictionary error naming the first unknown word
    pub fn from_words<S: AsRef<str>>(dictionary: &PhoneticDictionary, words: &[S]) -> Result<Self> {
        let entries = words
            .iter()
            .map(|w| {
                dictionary
                    .lookup(w.as_ref())
                    .cloned()
                    .ok_or_else(|| Error::Dictionary(format!("unknown word: {}", w.as_ref())))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(entries))
    }

    /// Every word in a category, easiest first
    #[must_use]
    pub fn for_category(dictionary: &PhoneticDictionary, category: Category) -> Self {
        let mut words: Vec<WordEntry> = dictionary.words_in(category).into_iter().cloned().collect();
        words.sort_by(|a, b| a.difficulty.cmp(&b.difficulty).then_with(|| a.word.cmp(&b.word)));
        Self::new(words)
    }

    /// Word currently being practiced
    #[must_use]
    pub fn current(&self) -> Option<&WordEntry> {
        self.pending.front()
    }

    /// Mark the current word done and move to the next
    pub fn advance(&mut self) -> Option<&WordEntry> {
        if let Some(done) = self.pending.pop_front() {
            tracing::info!(word = %done.word, remaining = self.pending.len(), "target word mastered");
            self.completed.push(done.word);
        }
        self.pending.front()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Words mastered so far, in order
    #[must_use]
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_through_words_in_order() {
        let dict = PhoneticDictionary::builtin();
        let mut plan = LessonPlan::from_words(dict, &["red", "three"]).unwrap();
        assert_eq!(plan.current().unwrap().word, "red");
        assert_eq!(plan.advance().unwrap().word, "three");
        assert!(plan.advance().is_none());
        assert!(plan.is_finished());
        assert_eq!(plan.completed(), ["red", "three"]);
        assert!(plan.advance().is_none());
    }

    #[test]
    fn unknown_word_is_rejected() {
        let err = LessonPlan::from_words(PhoneticDictionary::builtin(), &["xyzzy"]).unwrap_err();
        assert!(matches!(err, Error::Dictionary(_)));
    }

    #[test]
    fn category_plan_is_sorted_by_difficulty() {
        let plan = LessonPlan::for_category(PhoneticDictionary::builtin(), Category::Colors);
        assert!(!plan.is_finished());
        let levels: Vec<u8> = plan.pending.iter().map(|w| w.difficulty.level()).collect();
        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
    }
}
