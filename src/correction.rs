//! Pronunciation check against an expected word
//!
//! A heard word either matches the expected word exactly (ignoring case and
//! surrounding whitespace) or produces a [`CorrectionCase`] that the feedback
//! surface renders with the focus phonemes highlighted.

use serde::Serialize;

use crate::phonetics::{PhoneticDictionary, WordEntry};

/// Outcome of comparing a heard word with the expected word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Pronounced as expected
    Accepted,
    /// Mismatch, with the data needed to coach the learner
    Correction(CorrectionCase),
}

impl Verdict {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Transient comparison result for a mismatched word
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionCase {
    /// The word as recognized
    pub heard_word: String,
    /// The word the learner was aiming for
    pub target: WordEntry,
}

/// One phoneme of the target word and whether it is in focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhonemeMark<'a> {
    pub phoneme: &'a str,
    pub focus: bool,
}

impl CorrectionCase {
    /// Target phonemes in order, each marked with its focus flag
    ///
    /// Several phonemes may be in focus at once when the target is a
    /// cluster such as "sk".
    #[must_use]
    pub fn marked_phonemes(&self) -> Vec<PhonemeMark<'_>> {
        self.target
            .phonemes
            .iter()
            .map(|p| PhonemeMark {
                phoneme: p,
                focus: is_focus_phoneme(p, &self.target.target_sound),
            })
            .collect()
    }

    /// Only the phonemes in focus
    #[must_use]
    pub fn focus_phonemes(&self) -> Vec<&str> {
        self.marked_phonemes()
            .into_iter()
            .filter(|m| m.focus)
            .map(|m| m.phoneme)
            .collect()
    }

    /// Short coaching line for the feedback surface
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "I heard \"{}\". Did you mean \"{}\"? Listen for the /{}/ sound.",
            self.heard_word, self.target.word, self.target.target_sound
        )
    }

    /// Phoneme breakdown with focus phonemes bracketed, e.g. `[r] eh d`
    #[must_use]
    pub fn breakdown(&self) -> String {
        self.marked_phonemes()
            .iter()
            .map(|m| {
                if m.focus {
                    format!("[{}]", m.phoneme)
                } else {
                    m.phoneme.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Compare a heard word against the expected entry
#[must_use]
pub fn evaluate(heard_word: &str, expected: &WordEntry) -> Verdict {
    let heard = heard_word.trim();

    if heard.to_lowercase() == expected.word.to_lowercase() {
        tracing::debug!(word = %expected.word, "pronunciation accepted");
        Verdict::Accepted
    } else {
        tracing::debug!(heard, expected = %expected.word, "pronunciation mismatch");
        Verdict::Correction(CorrectionCase {
            heard_word: heard.to_string(),
            target: expected.clone(),
        })
    }
}

/// Whether `phoneme` carries the target sound
///
/// Containment is checked both ways so a cluster target ("th", "sp")
/// highlights single-letter tokens and vice versa.
#[must_use]
pub fn is_focus_phoneme(phoneme: &str, target_sound: &str) -> bool {
    phoneme.contains(target_sound) || target_sound.contains(phoneme)
}

/// Pick the word to judge out of a full transcription
///
/// Prefers a token naming the target (directly or via plural fallback),
/// otherwise the last word spoken. Returns `None` for a transcription with
/// no word characters.
#[must_use]
pub fn heard_word<'a>(
    transcription: &'a str,
    target: &WordEntry,
    dictionary: &PhoneticDictionary,
) -> Option<&'a str> {
    let tokens: Vec<&str> = transcription
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|t| !t.is_empty())
        .collect();

    tokens
        .iter()
        .copied()
        .find(|t| {
            t.eq_ignore_ascii_case(&target.word)
                || dictionary
                    .lookup(t)
                    .is_some_and(|e| e.word == target.word)
        })
        .or_else(|| tokens.last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonetics::{Category, Difficulty};

    fn entry(word: &str, phonemes: &[&str], target: &str) -> WordEntry {
        WordEntry {
            word: word.to_string(),
            phonemes: phonemes.iter().map(ToString::to_string).collect(),
            target_sound: target.to_string(),
            difficulty: Difficulty::EASY,
            category: Category::Colors,
        }
    }

    #[test]
    fn exact_match_is_accepted_ignoring_case_and_padding() {
        let red = entry("red", &["r", "eh", "d"], "r");
        assert!(evaluate("red", &red).is_accepted());
        assert!(evaluate("  RED\n", &red).is_accepted());
    }

    #[test]
    fn mismatch_builds_correction_case() {
        let red = entry("red", &["r", "eh", "d"], "r");
        match evaluate("wed", &red) {
            Verdict::Correction(case) => {
                assert_eq!(case.heard_word, "wed");
                assert_eq!(case.target, red);
            }
            Verdict::Accepted => panic!("expected a correction"),
        }
    }

    #[test]
    fn plural_is_not_an_exact_match() {
        let red = entry("red", &["r", "eh", "d"], "r");
        assert!(!evaluate("reds", &red).is_accepted());
    }

    #[test]
    fn single_focus_phoneme_for_red() {
        let red = entry("red", &["r", "eh", "d"], "r");
        let Verdict::Correction(case) = evaluate("wed", &red) else {
            panic!("expected a correction");
        };
        assert_eq!(case.focus_phonemes(), ["r"]);
        assert_eq!(case.breakdown(), "[r] eh d");
    }

    #[test]
    fn cluster_focus_for_three() {
        let three = entry("three", &["th", "r", "ee"], "th");
        let Verdict::Correction(case) = evaluate("free", &three) else {
            panic!("expected a correction");
        };
        assert_eq!(case.focus_phonemes(), ["th"]);
    }

    #[test]
    fn cluster_target_marks_every_contained_token() {
        let spoon = entry("spoon", &["s", "p", "oo", "n"], "sp");
        let Verdict::Correction(case) = evaluate("poon", &spoon) else {
            panic!("expected a correction");
        };
        assert_eq!(case.focus_phonemes(), ["s", "p"]);
    }

    #[test]
    fn containment_is_bidirectional() {
        assert!(is_focus_phoneme("th", "t"));
        assert!(is_focus_phoneme("t", "th"));
        assert!(!is_focus_phoneme("eh", "r"));
    }

    #[test]
    fn prompt_names_both_words_and_sound() {
        let red = entry("red", &["r", "eh", "d"], "r");
        let Verdict::Correction(case) = evaluate("wed", &red) else {
            panic!("expected a correction");
        };
        let prompt = case.prompt();
        assert!(prompt.contains("\"wed\""));
        assert!(prompt.contains("\"red\""));
        assert!(prompt.contains("/r/"));
    }

    #[test]
    fn heard_word_prefers_target_token() {
        let dict = PhoneticDictionary::builtin();
        let frog = dict.lookup("frog").unwrap();
        assert_eq!(heard_word("I see two Frogs!", frog, dict), Some("Frogs"));
        assert_eq!(heard_word("it's a fog.", frog, dict), Some("fog"));
        assert_eq!(heard_word(" ... ", frog, dict), None);
    }
}
