//! Phonetic dictionary
//!
//! Maps practice words to their phoneme breakdown and the sound under focus.
//! The built-in table is loaded once; an optional TOML overlay can add or
//! replace entries at startup. Nothing mutates the dictionary afterwards.

mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Semantic tag attached to every practice word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Animals,
    Fruit,
    Vegetables,
    Colors,
    Numbers,
    Objects,
    Actions,
    Body,
    Nature,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Self; 9] = [
        Self::Animals,
        Self::Fruit,
        Self::Vegetables,
        Self::Colors,
        Self::Numbers,
        Self::Objects,
        Self::Actions,
        Self::Body,
        Self::Nature,
    ];

    /// Upper-case tag as used in data files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Animals => "ANIMALS",
            Self::Fruit => "FRUIT",
            Self::Vegetables => "VEGETABLES",
            Self::Colors => "COLORS",
            Self::Numbers => "NUMBERS",
            Self::Objects => "OBJECTS",
            Self::Actions => "ACTIONS",
            Self::Body => "BODY",
            Self::Nature => "NATURE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::Dictionary(format!("unknown category: {s}")))
    }
}

/// How hard a word is to pronounce, 1 (easy) to 3 (hard)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const EASY: Self = Self(1);
    pub const MEDIUM: Self = Self(2);
    pub const HARD: Self = Self(3);

    /// Numeric level
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        if (1..=3).contains(&level) {
            Ok(Self(level))
        } else {
            Err(Error::Dictionary(format!(
                "difficulty must be 1, 2 or 3 (got {level})"
            )))
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A known practice word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    /// Canonical spelling, lowercase and trimmed
    pub word: String,
    /// Ordered phoneme symbols
    pub phonemes: Vec<String>,
    /// Phoneme or cluster under pedagogical focus
    pub target_sound: String,
    pub difficulty: Difficulty,
    pub category: Category,
}

impl WordEntry {
    fn validate(&self) -> Result<()> {
        if self.word.is_empty() || self.word != normalize(&self.word) {
            return Err(Error::Dictionary(format!(
                "word key must be lowercase and trimmed: {:?}",
                self.word
            )));
        }
        if self.phonemes.is_empty() {
            return Err(Error::Dictionary(format!("{}: no phonemes", self.word)));
        }
        if self.target_sound.trim().is_empty() {
            return Err(Error::Dictionary(format!("{}: empty target sound", self.word)));
        }
        if !self
            .phonemes
            .iter()
            .any(|p| crate::correction::is_focus_phoneme(p, &self.target_sound))
        {
            return Err(Error::Dictionary(format!(
                "{}: target sound /{}/ matches none of {:?}",
                self.word, self.target_sound, self.phonemes
            )));
        }
        Ok(())
    }
}

/// Overlay file schema: a list of `[[word]]` tables
#[derive(Debug, Default, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    word: Vec<WordEntry>,
}

static BUILTIN: LazyLock<PhoneticDictionary> = LazyLock::new(|| {
    let entries = builtin::WORDS
        .iter()
        .map(|raw| {
            let entry = WordEntry {
                word: raw.word.to_string(),
                phonemes: raw.phonemes.iter().map(ToString::to_string).collect(),
                target_sound: raw.target_sound.to_string(),
                difficulty: Difficulty(raw.difficulty),
                category: raw.category,
            };
            (entry.word.clone(), entry)
        })
        .collect();
    PhoneticDictionary { entries }
});

/// Static lookup from word to phonetic breakdown
#[derive(Debug, Clone, Default)]
pub struct PhoneticDictionary {
    entries: HashMap<String, WordEntry>,
}

impl PhoneticDictionary {
    /// The built-in word table
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Build a dictionary from explicit entries
    ///
    /// # Errors
    ///
    /// Returns error if an entry is malformed or a key repeats
    pub fn from_entries(entries: impl IntoIterator<Item = WordEntry>) -> Result<Self> {
        let mut dict = Self::default();
        for entry in entries {
            entry.validate()?;
            if dict.entries.contains_key(&entry.word) {
                return Err(Error::Dictionary(format!("duplicate word: {}", entry.word)));
            }
            dict.entries.insert(entry.word.clone(), entry);
        }
        Ok(dict)
    }

    /// Parse `[[word]]` tables from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML or an entry is malformed
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: DictionaryFile = toml::from_str(content)?;
        Self::from_entries(file.word)
    }

    /// Built-in table with an optional overlay file merged on top
    ///
    /// Overlay entries replace built-in entries with the same key.
    ///
    /// # Errors
    ///
    /// Returns error if the overlay cannot be read or parsed
    pub fn load(overlay: Option<&Path>) -> Result<Self> {
        let mut dict = Self::builtin().clone();

        if let Some(path) = overlay {
            let content = std::fs::read_to_string(path)?;
            let extra = Self::from_toml_str(&content)?;
            tracing::info!(
                path = %path.display(),
                words = extra.len(),
                "loaded dictionary overlay"
            );
            dict.entries.extend(extra.entries);
        }

        tracing::debug!(words = dict.len(), "phonetic dictionary ready");
        Ok(dict)
    }

    /// Look up a word
    ///
    /// Input is lowercased and trimmed. If the exact form is absent, one
    /// trailing "s" is stripped and the lookup retried once.
    #[must_use]
    pub fn lookup(&self, word: &str) -> Option<&WordEntry> {
        let normalized = normalize(word);

        if let Some(entry) = self.entries.get(&normalized) {
            return Some(entry);
        }

        normalized
            .strip_suffix('s')
            .and_then(|singular| self.entries.get(singular))
    }

    /// Number of words
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary holds no words
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by word
    #[must_use]
    pub fn entries(&self) -> Vec<&WordEntry> {
        let mut all: Vec<_> = self.entries.values().collect();
        all.sort_by(|a, b| a.word.cmp(&b.word));
        all
    }

    /// Entries in a category, sorted by word
    #[must_use]
    pub fn words_in(&self, category: Category) -> Vec<&WordEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Entries at a difficulty level, sorted by word
    #[must_use]
    pub fn words_at(&self, difficulty: Difficulty) -> Vec<&WordEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.difficulty == difficulty)
            .collect()
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_entries_are_valid() {
        let dict = PhoneticDictionary::builtin();
        assert!(dict.len() > 100);
        for entry in dict.entries() {
            entry.validate().unwrap();
        }
    }

    #[test]
    fn lookup_normalizes_case_and_whitespace() {
        let dict = PhoneticDictionary::builtin();
        let entry = dict.lookup("  RED ").unwrap();
        assert_eq!(entry.word, "red");
        assert_eq!(entry.phonemes, ["r", "eh", "d"]);
    }

    #[test]
    fn lookup_strips_one_plural_s() {
        let dict = PhoneticDictionary::builtin();
        assert_eq!(dict.lookup("Frogs").unwrap().word, "frog");
        assert!(dict.lookup("frogss").is_none());
    }

    #[test]
    fn exact_key_wins_over_plural_fallback() {
        // "vase" ends in s but is its own key; "vases" -> "vase"
        let dict = PhoneticDictionary::builtin();
        assert_eq!(dict.lookup("vase").unwrap().word, "vase");
        assert_eq!(dict.lookup("vases").unwrap().word, "vase");
    }

    #[test]
    fn lookup_misses_unknown_words() {
        let dict = PhoneticDictionary::builtin();
        assert!(dict.lookup("xylophone").is_none());
        assert!(dict.lookup("").is_none());
        assert!(dict.lookup("s").is_none());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("animals".parse::<Category>().unwrap(), Category::Animals);
        assert_eq!(" Nature ".parse::<Category>().unwrap(), Category::Nature);
        assert!("planets".parse::<Category>().is_err());
    }

    #[test]
    fn difficulty_rejects_out_of_range() {
        assert!(Difficulty::try_from(0).is_err());
        assert!(Difficulty::try_from(4).is_err());
        assert_eq!(Difficulty::try_from(2).unwrap(), Difficulty::MEDIUM);
    }

    #[test]
    fn queries_filter_by_category_and_difficulty() {
        let dict = PhoneticDictionary::builtin();
        let colors = dict.words_in(Category::Colors);
        let names: Vec<_> = colors.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(names, ["black", "blue", "green", "red"]);

        assert!(
            dict.words_at(Difficulty::HARD)
                .iter()
                .all(|e| e.difficulty.level() == 3)
        );
    }

    #[test]
    fn toml_overlay_parses_and_validates() {
        let dict = PhoneticDictionary::from_toml_str(
            r#"
            [[word]]
            word = "zebra"
            phonemes = ["z", "ee", "b", "r", "uh"]
            target_sound = "z"
            difficulty = 2
            category = "ANIMALS"
            "#,
        )
        .unwrap();
        let zebra = dict.lookup("zebras").unwrap();
        assert_eq!(zebra.category, Category::Animals);
        assert_eq!(zebra.difficulty, Difficulty::MEDIUM);
    }

    #[test]
    fn overlay_rejects_unmatched_target_sound() {
        let err = PhoneticDictionary::from_toml_str(
            r#"
            [[word]]
            word = "zebra"
            phonemes = ["z", "ee", "b", "r", "uh"]
            target_sound = "k"
            difficulty = 2
            category = "ANIMALS"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Dictionary(_)));
    }

    #[test]
    fn overlay_rejects_bad_difficulty_and_keys() {
        assert!(
            PhoneticDictionary::from_toml_str(
                r#"
                [[word]]
                word = "Zebra"
                phonemes = ["z"]
                target_sound = "z"
                difficulty = 1
                category = "ANIMALS"
                "#,
            )
            .is_err()
        );
        assert!(
            PhoneticDictionary::from_toml_str(
                r#"
                [[word]]
                word = "zebra"
                phonemes = ["z"]
                target_sound = "z"
                difficulty = 7
                category = "ANIMALS"
                "#,
            )
            .is_err()
        );
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let red = PhoneticDictionary::builtin().lookup("red").unwrap().clone();
        let err = PhoneticDictionary::from_entries([red.clone(), red]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn display_honours_width() {
        assert_eq!(format!("{:<8}|", Category::Colors), "COLORS  |");
        assert_eq!(format!("{:>3}|", Difficulty::HARD), "  3|");
    }
}
