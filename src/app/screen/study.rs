// SPDX-License-Identifier: GPL-3.0-only

use rand::rngs::StdRng;
use tokio::task::JoinHandle;

use crate::app::core::{
    enrichment::{ContextFetcher, ContextPanel},
    models::{Card, Direction},
    session::{AnswerOutcome, CategoryCounts, StudySession},
};

/// Study run over a chunk of a deck together with the context panel of the current word
pub struct StudyScreen {
    session: StudySession,
    fetcher: ContextFetcher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Reveal the answer
    Flip,
    /// Record whether the user knew the answer
    Answer(bool),
    /// Reshuffle the cards that are not mastered yet
    Shuffle,
    /// Start the run over
    Reset,
    ChangeDirection,
    /// Ask for a sample sentence of the current word
    RequestContext,
    /// Leave the run early
    End,
}

#[derive(Debug, PartialEq)]
pub enum Action {
    None,
    /// The current card left the pool, front-ends may celebrate
    Mastered,
    /// Every card is mastered, carries the progress to write back
    Completed(Vec<Card>),
    /// The user left, carries the progress to write back
    End(Vec<Card>),
}

impl StudyScreen {
    pub fn new(cards: Vec<Card>, fetcher: ContextFetcher) -> Self {
        Self::with_session(StudySession::new(cards), fetcher)
    }

    /// Init a new [`StudyScreen`] with an explicit random generator, for reproducible runs
    pub fn with_rng(cards: Vec<Card>, fetcher: ContextFetcher, rng: StdRng) -> Self {
        Self::with_session(StudySession::with_rng(cards, rng), fetcher)
    }

    fn with_session(session: StudySession, fetcher: ContextFetcher) -> Self {
        Self { session, fetcher }
    }

    /// Builder to start in the given [`Direction`]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        if self.session.direction() != direction {
            self.session.change_direction();
        }
        self
    }

    pub fn session(&self) -> &StudySession {
        &self.session
    }

    /// State of the context panel
    pub fn context(&self) -> ContextPanel {
        self.fetcher.panel()
    }

    /// Header line, e.g. `Card 2 of 7`
    pub fn position_text(&self) -> String {
        if self.session.is_complete() {
            return String::from("Complete");
        }
        format!(
            "Card {} of {}",
            self.session.current_index() + 1,
            self.session.remaining()
        )
    }

    pub fn counts(&self) -> CategoryCounts {
        self.session.category_counts()
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::Flip => {
                self.session.flip();
                Action::None
            }
            Message::Answer(is_correct) => {
                let outcome = self.session.answer(is_correct);
                if outcome != AnswerOutcome::Ignored {
                    self.fetcher.clear();
                }

                match outcome {
                    AnswerOutcome::Ignored | AnswerOutcome::Advanced => Action::None,
                    AnswerOutcome::Mastered => Action::Mastered,
                    AnswerOutcome::Completed => {
                        Action::Completed(self.session.progress_snapshot())
                    }
                }
            }
            Message::Shuffle => {
                self.session.shuffle_remaining();
                self.fetcher.clear();
                Action::None
            }
            Message::Reset => {
                self.session.reset();
                self.fetcher.clear();
                Action::None
            }
            Message::ChangeDirection => {
                self.session.change_direction();
                self.fetcher.clear();
                Action::None
            }
            Message::RequestContext => {
                self.request_context();
                Action::None
            }
            Message::End => {
                self.fetcher.cancel();
                Action::End(self.session.progress_snapshot())
            }
        }
    }

    /// Start fetching context for the current prompt, returns the request handle if one was spawned
    pub fn request_context(&mut self) -> Option<JoinHandle<()>> {
        let word = self.session.prompt()?.to_string();

        let already_shown = match self.fetcher.panel() {
            ContextPanel::Loading { word: shown } | ContextPanel::Ready { word: shown, .. } => {
                shown == word
            }
            _ => false,
        };
        if already_shown {
            return None;
        }

        let language = self.session.direction().prompt_language();
        self.fetcher.request(&word, language)
    }
}
