// SPDX-License-Identifier: GPL-3.0-only

//! Vocabulary flashcard trainer: decks of word pairs, study runs that track a mastery streak
//! per card, and optional example sentences for the studied word.

pub mod app;

pub use app::core::config::{Config, ConfigError, StorageBackend};
pub use app::core::enrichment::{
    ContextError, ContextFetcher, ContextPanel, ContextProvider, GeminiProvider, WordContext,
};
pub use app::core::models::{Card, Deck, Direction, Language, MASTERED_STREAK, NewDeck};
pub use app::core::session::{AnswerOutcome, CategoryCounts, SessionPhase, StudySession};
pub use app::core::settings;
pub use app::core::store::{
    DeckStore, DocumentStore, FileStorage, KeyValueStorage, LocalDeckStore, MemoryStorage, Scope,
};
pub use app::screen::{StudyScreen, study};
pub use app::{AppError, Databank, Page};
