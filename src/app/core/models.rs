// SPDX-License-Identifier: GPL-3.0

pub mod card;
pub mod deck;

pub use card::{Card, Direction, Language, MASTERED_STREAK};
pub use deck::{Deck, NewDeck};
