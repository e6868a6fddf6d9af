// SPDX-License-Identifier: GPL-3.0

use serde::{Deserialize, Serialize};

/// Streak value at which a [`Card`] counts as mastered
pub const MASTERED_STREAK: u8 = 3;

/// A word pair plus its mastery streak
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Card {
    pub original: String,
    pub translation: String,

    /// 0 = learning, 1-2 = partially correct, 3 = mastered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

/// Two cards are the same card when their word pair matches, progress is ignored
impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.same_pair(other)
    }
}

impl Eq for Card {}

impl Card {
    /// Init a new [`Card`] without progress
    pub fn new<O, T>(original: O, translation: T) -> Self
    where
        O: Into<String>,
        T: Into<String>,
    {
        Self {
            original: original.into(),
            translation: translation.into(),
            progress: None,
        }
    }

    /// Builder to set the stored progress of a [`Card`]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Starting streak of the card, missing progress counts as 0 and anything above mastery is clamped
    pub fn streak(&self) -> u8 {
        self.progress.unwrap_or(0).min(MASTERED_STREAK)
    }

    /// Returns true if the stored progress marks the card as mastered
    pub fn is_mastered(&self) -> bool {
        self.streak() >= MASTERED_STREAK
    }

    /// Returns true if both cards carry the same `(original, translation)` pair
    pub fn same_pair(&self, other: &Card) -> bool {
        self.original == other.original && self.translation == other.translation
    }

    /// Returns true if the card is ready to be stored
    pub fn is_valid(&self) -> bool {
        !self.original.trim().is_empty() && !self.translation.trim().is_empty()
    }

    /// Text shown as the question for the given [`Direction`]
    pub fn prompt(&self, direction: Direction) -> &str {
        match direction {
            Direction::DeEn => &self.original,
            Direction::EnDe => &self.translation,
        }
    }

    /// Text revealed when the card is flipped for the given [`Direction`]
    pub fn answer(&self, direction: Direction) -> &str {
        match direction {
            Direction::DeEn => &self.translation,
            Direction::EnDe => &self.original,
        }
    }
}

/// Which side of the pair is asked and which one is revealed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    DeEn,
    EnDe,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Direction::DeEn => write!(f, "de-en"),
            Direction::EnDe => write!(f, "en-de"),
        }
    }
}

impl Direction {
    /// The other [`Direction`]
    pub fn toggled(self) -> Self {
        match self {
            Direction::DeEn => Direction::EnDe,
            Direction::EnDe => Direction::DeEn,
        }
    }

    /// Language of the prompt side
    pub fn prompt_language(self) -> Language {
        match self {
            Direction::DeEn => Language::German,
            Direction::EnDe => Language::English,
        }
    }
}

/// Language of a studied word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    German,
    English,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Language::German => write!(f, "German"),
            Language::English => write!(f, "English"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_progress_starts_at_zero() {
        let card = Card::new("der Fluss", "the river");
        assert_eq!(card.streak(), 0);
        assert!(!card.is_mastered());
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        let card = Card::new("der Berg", "the mountain").with_progress(7);
        assert_eq!(card.streak(), MASTERED_STREAK);
        assert!(card.is_mastered());
    }

    #[test]
    fn identity_ignores_progress() {
        let a = Card::new("das Tal", "the valley").with_progress(2);
        let b = Card::new("das Tal", "the valley");
        let c = Card::new("das Tal", "the dale");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn direction_selects_prompt_and_answer() {
        let card = Card::new("der Wald", "the forest");
        assert_eq!(card.prompt(Direction::DeEn), "der Wald");
        assert_eq!(card.answer(Direction::DeEn), "the forest");
        assert_eq!(card.prompt(Direction::EnDe), "the forest");
        assert_eq!(card.answer(Direction::EnDe), "der Wald");
        assert_eq!(Direction::DeEn.toggled(), Direction::EnDe);
        assert_eq!(Direction::EnDe.prompt_language(), Language::English);
    }

    #[test]
    fn progress_is_omitted_when_absent() {
        let json = serde_json::to_string(&Card::new("a", "b")).unwrap();
        assert_eq!(json, r#"{"original":"a","translation":"b"}"#);

        let card: Card = serde_json::from_str(r#"{"original":"a","translation":"b","progress":2}"#)
            .unwrap();
        assert_eq!(card.progress, Some(2));
    }
}
