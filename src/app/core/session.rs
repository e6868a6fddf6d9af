// SPDX-License-Identifier: GPL-3.0

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::app::core::models::{Card, Direction, MASTERED_STREAK};

/// One study run over a fixed set of cards.
///
/// The session keeps a snapshot of the cards it was started with (`source_cards`), the streak of
/// each of them by position, and the pool of cards still to be mastered in presentation order.
/// It is complete when that pool is empty. A session that does not exist yet plays the role of
/// the uninitialized state: front-ends hold an `Option<StudySession>`.
pub struct StudySession<R = StdRng> {
    source_cards: Vec<Card>,
    /// Streak of `source_cards[i]`, always the same length as `source_cards`
    card_progress: Vec<u8>,
    active_cards: Vec<Card>,
    current_index: usize,
    is_flipped: bool,
    direction: Direction,
    rng: R,
}

/// Result of [`StudySession::answer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// There was no current card or it could not be matched, nothing changed
    Ignored,
    /// The streak changed and the session moved to the next card
    Advanced,
    /// The card reached the mastery streak and left the active pool
    Mastered,
    /// The card was mastered and it was the last one in the pool
    Completed,
}

/// Derived phase of a [`StudySession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Complete,
}

/// How many cards sit at each streak value
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCounts {
    pub learning: usize,
    pub once_right: usize,
    pub twice_right: usize,
    pub mastered: usize,
}

impl StudySession<StdRng> {
    /// Init a new [`StudySession`] shuffled with an OS seeded generator
    pub fn new(cards: Vec<Card>) -> Self {
        Self::with_rng(cards, StdRng::from_os_rng())
    }
}

impl<R: Rng> StudySession<R> {
    /// Init a new [`StudySession`] using the given random generator for every shuffle
    pub fn with_rng(cards: Vec<Card>, rng: R) -> Self {
        let mut session = Self {
            source_cards: cards,
            card_progress: Vec::new(),
            active_cards: Vec::new(),
            current_index: 0,
            is_flipped: false,
            direction: Direction::default(),
            rng,
        };
        session.initialize();
        session
    }

    /// Start over from the input cards: streaks go back to each card's stored progress and
    /// the whole input set is reshuffled, mastered cards included. Direction is kept.
    pub fn reset(&mut self) {
        self.initialize();
    }

    fn initialize(&mut self) {
        self.card_progress = self.source_cards.iter().map(Card::streak).collect();
        // Cards that start mastered are not filtered out here, unlike `shuffle_remaining`
        self.active_cards = self.source_cards.clone();
        self.active_cards.shuffle(&mut self.rng);
        self.current_index = 0;
        self.is_flipped = false;

        tracing::debug!(
            cards = self.source_cards.len(),
            "study session initialized"
        );
    }

    /// Reveal the answer face, flipping back only happens when the card changes
    pub fn flip(&mut self) {
        if !self.is_flipped {
            self.is_flipped = true;
        }
    }

    /// Record an answer for the current card and move on
    pub fn answer(&mut self, is_correct: bool) -> AnswerOutcome {
        let Some(current) = self.active_cards.get(self.current_index) else {
            return AnswerOutcome::Ignored;
        };
        let Some(source_index) = self.source_cards.iter().position(|c| c.same_pair(current))
        else {
            return AnswerOutcome::Ignored;
        };

        let streak = self.card_progress[source_index];
        let next_streak = if is_correct {
            (streak + 1).min(MASTERED_STREAK)
        } else {
            0
        };
        self.card_progress[source_index] = next_streak;
        self.is_flipped = false;

        tracing::debug!(
            card = source_index,
            is_correct,
            streak = next_streak,
            "card answered"
        );

        if is_correct && next_streak == MASTERED_STREAK {
            let mastered = self.source_cards[source_index].clone();
            self.active_cards.retain(|c| !c.same_pair(&mastered));
            if self.current_index >= self.active_cards.len() {
                self.current_index = 0;
            }

            if self.active_cards.is_empty() {
                tracing::debug!("study session complete");
                AnswerOutcome::Completed
            } else {
                AnswerOutcome::Mastered
            }
        } else {
            self.current_index = (self.current_index + 1) % self.active_cards.len().max(1);
            AnswerOutcome::Advanced
        }
    }

    /// Reshuffle the source cards that are not mastered yet into a new active pool
    pub fn shuffle_remaining(&mut self) {
        let remaining: Vec<Card> = self
            .source_cards
            .iter()
            .zip(&self.card_progress)
            .filter(|(_, streak)| **streak < MASTERED_STREAK)
            .map(|(card, _)| card.clone())
            .collect();

        self.active_cards = remaining;
        self.active_cards.shuffle(&mut self.rng);
        self.current_index = 0;
        self.is_flipped = false;
    }

    /// Swap prompt and answer sides, hiding a revealed answer
    pub fn change_direction(&mut self) {
        self.direction = self.direction.toggled();
        self.is_flipped = false;
    }
}

impl<R> StudySession<R> {
    /// The card currently shown, [`None`] once the session is complete
    pub fn current_card(&self) -> Option<&Card> {
        self.active_cards.get(self.current_index)
    }

    /// Question text of the current card
    pub fn prompt(&self) -> Option<&str> {
        self.current_card().map(|c| c.prompt(self.direction))
    }

    /// Answer text of the current card, regardless of whether it has been revealed
    pub fn answer_text(&self) -> Option<&str> {
        self.current_card().map(|c| c.answer(self.direction))
    }

    pub fn is_complete(&self) -> bool {
        self.active_cards.is_empty()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_complete() {
            SessionPhase::Complete
        } else {
            SessionPhase::Active
        }
    }

    pub fn is_flipped(&self) -> bool {
        self.is_flipped
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn source_cards(&self) -> &[Card] {
        &self.source_cards
    }

    pub fn active_cards(&self) -> &[Card] {
        &self.active_cards
    }

    /// Streak of every source card, by position
    pub fn card_progress(&self) -> &[u8] {
        &self.card_progress
    }

    /// Streak of the source card at `index`
    pub fn streak(&self, index: usize) -> Option<u8> {
        self.card_progress.get(index).copied()
    }

    /// Cards left in the active pool
    pub fn remaining(&self) -> usize {
        self.active_cards.len()
    }

    /// Size of the input set
    pub fn total(&self) -> usize {
        self.source_cards.len()
    }

    pub fn mastered_count(&self) -> usize {
        self.card_progress
            .iter()
            .filter(|s| **s >= MASTERED_STREAK)
            .count()
    }

    pub fn category_counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for streak in &self.card_progress {
            match streak {
                0 => counts.learning += 1,
                1 => counts.once_right += 1,
                2 => counts.twice_right += 1,
                _ => counts.mastered += 1,
            }
        }
        counts
    }

    /// The input cards in their original order with `progress` set from the session streaks
    pub fn progress_snapshot(&self) -> Vec<Card> {
        self.source_cards
            .iter()
            .zip(&self.card_progress)
            .map(|(card, streak)| Card {
                progress: Some(*streak),
                ..card.clone()
            })
            .collect()
    }
}
