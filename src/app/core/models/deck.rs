// SPDX-License-Identifier: GPL-3.0

use serde::{Deserialize, Serialize};

use super::card::Card;

/// A named collection of word pairs, also called a databank
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// The data needed to create a [`Deck`], the store assigns the id
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeck {
    pub name: String,
    pub cards: Vec<Card>,
}

impl From<Deck> for NewDeck {
    fn from(deck: Deck) -> Self {
        Self {
            name: deck.name,
            cards: deck.cards,
        }
    }
}

impl NewDeck {
    /// Attach an identifier, producing the stored [`Deck`]
    pub fn into_deck(self, id: String) -> Deck {
        Deck {
            id,
            name: self.name,
            cards: self.cards,
        }
    }
}

impl Deck {
    /// Number of cards whose stored progress marks them as mastered
    pub fn mastered_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_mastered()).count()
    }

    /// Copies progress from `progress` onto the cards of this deck with the same word pair.
    ///
    /// Cards not present in `progress` keep their current value. Returns how many cards changed.
    pub fn merge_progress(&mut self, progress: &[Card]) -> usize {
        let mut changed = 0;
        for card in &mut self.cards {
            if let Some(studied) = progress.iter().find(|p| p.same_pair(card))
                && card.progress != studied.progress
            {
                card.progress = studied.progress;
                changed += 1;
            }
        }
        changed
    }

    /// Replaces the cards keeping the progress of every pair that was already in the deck
    pub fn replace_cards(&mut self, cards: Vec<Card>) {
        let previous = std::mem::take(&mut self.cards);
        self.cards = cards
            .into_iter()
            .map(|mut card| {
                if card.progress.is_none() {
                    card.progress = previous
                        .iter()
                        .find(|old| old.same_pair(&card))
                        .and_then(|old| old.progress);
                }
                card
            })
            .collect();
    }
}
