// SPDX-License-Identifier: GPL-3.0

use thiserror::Error;

use crate::app::core::models::{Card, NewDeck};

/// Expected shape of a vocabulary line, shown to the user when nothing parses
pub const LINE_FORMAT: &str = "German word, English translation";

/// Errors raised while validating a deck before it reaches the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckInputError {
    #[error("Databank name is required.")]
    EmptyName,
    #[error("No valid vocabulary found. Ensure each line is: `German word, English translation`.")]
    NoValidPairs,
}

/// Parses editor text into cards, one `original, translation` pair per line.
///
/// Each line is split on its first comma so translations may contain commas themselves.
/// Lines without a comma or with an empty side are skipped.
pub fn parse_vocabulary(content: &str) -> Vec<Card> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let (original, translation) = line.split_once(',')?;
            let card = Card::new(original.trim(), translation.trim());
            card.is_valid().then_some(card)
        })
        .collect()
}

/// Renders cards back to the editor format
pub fn vocabulary_text(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| format!("{}, {}", c.original, c.translation))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validates the editor form and builds the [`NewDeck`]
pub fn parse_deck_input(name: &str, content: &str) -> Result<NewDeck, DeckInputError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DeckInputError::EmptyName);
    }

    let cards = parse_vocabulary(content);
    if cards.is_empty() {
        return Err(DeckInputError::NoValidPairs);
    }

    Ok(NewDeck {
        name: name.to_string(),
        cards,
    })
}

/// Sample content offered when creating a new deck
pub fn default_vocabulary() -> String {
    [
        "die Brücke, the bridge",
        "der Fluss, the river",
        "der Berg, the mountain",
        "das Tal, the valley",
        "der Wald, the forest",
    ]
    .join("\n")
}
