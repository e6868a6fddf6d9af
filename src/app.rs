// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::app::core::{
    config::Config,
    enrichment::ContextFetcher,
    models::{Card, Deck, NewDeck},
    store::{DeckStore, Scope},
    utils::{self, Alert, DeckInputError},
};
use crate::app::screen::{StudyScreen, study};

pub mod core;
pub mod screen;

/// Currently selected page
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Page {
    #[default]
    DeckList,
    DeckView(String),
    /// Editor for a new deck when `deck_id` is [`None`]
    DeckEditor {
        deck_id: Option<String>,
    },
    Study {
        deck_id: String,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Input(#[from] DeckInputError),
    #[error("{0}")]
    Store(anywho::Error),
    #[error("Deck not found")]
    DeckNotFound(String),
    #[error("This databank has no cards to study")]
    EmptyDeck,
    #[error("No databank is open")]
    NoDeckOpen,
    #[error("No study session in progress")]
    NoSession,
}

impl From<anywho::Error> for AppError {
    fn from(e: anywho::Error) -> Self {
        AppError::Store(e)
    }
}

/// The application model: deck list, navigation and the study run, driven by a front-end.
///
/// Store failures never change the in-memory state; they surface as an [`Alert`].
pub struct Databank {
    /// Persistence backend, injected
    store: Arc<dyn DeckStore>,
    /// Owner of the decks in `store`
    scope: Scope,
    /// Configuration data that persists between application runs
    config: Config,
    /// Decks of `scope`, in store order
    decks: Vec<Deck>,
    page: Page,
    study: Option<StudyScreen>,
    /// Last store failure, shown without blocking
    alert: Option<Alert>,
    /// Inline error of the current page
    error: Option<String>,
}

impl Databank {
    /// Load the decks of `scope`, migrating the legacy card list when there are none yet
    pub async fn init(
        store: Arc<dyn DeckStore>,
        scope: Scope,
        config: Config,
    ) -> Result<Self, AppError> {
        let mut decks = store.list(&scope).await?;

        if decks.is_empty()
            && let Some(deck) = store.migrate_legacy(&scope).await?
        {
            decks.push(deck);
        }

        tracing::info!(scope = %scope, decks = decks.len(), "decks loaded");

        Ok(Self {
            store,
            scope,
            config,
            decks,
            page: Page::default(),
            study: None,
            alert: None,
            error: None,
        })
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn deck(&self, deck_id: &str) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == deck_id)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn study(&self) -> Option<&StudyScreen> {
        self.study.as_ref()
    }

    pub fn study_mut(&mut self) -> Option<&mut StudyScreen> {
        self.study.as_mut()
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    /// Returns the pending alert, a front-end shows it once
    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch the deck list again
    pub async fn reload(&mut self) -> Result<(), AppError> {
        match self.store.list(&self.scope).await {
            Ok(decks) => {
                self.decks = decks;
                Ok(())
            }
            Err(e) => Err(self.store_failure(e)),
        }
    }

    //
    // Navigation
    //

    pub fn open_deck(&mut self, deck_id: &str) -> Result<(), AppError> {
        let deck_id = self.existing(deck_id)?;
        self.navigate(Page::DeckView(deck_id));
        Ok(())
    }

    pub fn new_deck(&mut self) {
        self.navigate(Page::DeckEditor { deck_id: None });
    }

    pub fn edit_deck(&mut self, deck_id: &str) -> Result<(), AppError> {
        let deck_id = self.existing(deck_id)?;
        self.navigate(Page::DeckEditor {
            deck_id: Some(deck_id),
        });
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        let Page::DeckEditor { deck_id } = &self.page else {
            return;
        };

        let page = match deck_id {
            Some(id) if self.deck(id).is_some() => Page::DeckView(id.clone()),
            _ => Page::DeckList,
        };
        self.navigate(page);
    }

    /// Go back a page, leaving a study run writes its progress back first
    pub async fn back(&mut self) -> Result<(), AppError> {
        match self.page.clone() {
            Page::DeckList => Ok(()),
            Page::DeckView(_) => {
                self.navigate(Page::DeckList);
                Ok(())
            }
            Page::DeckEditor { .. } => {
                self.cancel_edit();
                Ok(())
            }
            Page::Study { .. } => match self.study.as_mut().map(|s| s.update(study::Message::End))
            {
                Some(study::Action::End(progress)) => self.end_session(progress).await,
                _ => {
                    self.study = None;
                    self.navigate(Page::DeckList);
                    Ok(())
                }
            },
        }
    }

    fn navigate(&mut self, page: Page) {
        self.error = None;
        self.page = page;
    }

    fn existing(&mut self, deck_id: &str) -> Result<String, AppError> {
        if self.deck(deck_id).is_some() {
            return Ok(deck_id.to_string());
        }

        tracing::warn!(deck = %deck_id, "navigation to an unknown deck");
        let err = AppError::DeckNotFound(deck_id.to_string());
        self.error = Some(err.to_string());
        Err(err)
    }

    //
    // Deck editing
    //

    /// Name and vocabulary text the editor starts with
    pub fn editor_contents(&self) -> (String, String) {
        match &self.page {
            Page::DeckEditor {
                deck_id: Some(deck_id),
            } => self
                .deck(deck_id)
                .map(|deck| (deck.name.clone(), utils::vocabulary_text(&deck.cards)))
                .unwrap_or_default(),
            Page::DeckEditor { deck_id: None } => (String::new(), utils::default_vocabulary()),
            _ => (String::new(), String::new()),
        }
    }

    /// Create the deck being edited, or save the changes to it
    pub async fn save_deck(&mut self, name: &str, vocabulary: &str) -> Result<Deck, AppError> {
        let input = match utils::parse_deck_input(name, vocabulary) {
            Ok(input) => input,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let editing = match &self.page {
            Page::DeckEditor { deck_id } => deck_id.clone(),
            _ => None,
        };

        let result = match editing {
            Some(deck_id) => {
                let mut deck = self
                    .deck(&deck_id)
                    .cloned()
                    .ok_or_else(|| AppError::DeckNotFound(deck_id.clone()))?;
                deck.name = input.name;
                deck.replace_cards(input.cards);
                self.store.save(&self.scope, deck).await
            }
            None => self.store.create(&self.scope, input).await,
        };

        let deck = result.map_err(|e| self.store_failure(e))?;

        match self.decks.iter_mut().find(|d| d.id == deck.id) {
            Some(existing) => *existing = deck.clone(),
            None => self.decks.push(deck.clone()),
        }
        self.navigate(Page::DeckView(deck.id.clone()));

        Ok(deck)
    }

    pub async fn delete_deck(&mut self, deck_id: &str) -> Result<(), AppError> {
        self.store
            .delete(&self.scope, deck_id)
            .await
            .map_err(|e| self.store_failure(e))?;

        self.decks.retain(|d| d.id != deck_id);

        let on_deleted = match &self.page {
            Page::DeckView(id) | Page::Study { deck_id: id } => id == deck_id,
            Page::DeckEditor { deck_id: Some(id) } => id == deck_id,
            _ => false,
        };
        if on_deleted {
            self.study = None;
            self.navigate(Page::DeckList);
        }

        Ok(())
    }

    //
    // Study
    //

    /// Start a run over a random chunk of the open deck, [`None`] uses the configured chunk size
    pub fn start_session(&mut self, chunk_size: Option<usize>) -> Result<&mut StudyScreen, AppError> {
        let deck_id = match &self.page {
            Page::DeckView(id) => id.clone(),
            _ => return Err(AppError::NoDeckOpen),
        };
        let deck = self
            .deck(&deck_id)
            .ok_or_else(|| AppError::DeckNotFound(deck_id.clone()))?;

        let chunk_size = chunk_size.unwrap_or(self.config.chunk_size()).max(1);
        let cards: Vec<Card> = deck
            .cards
            .choose_multiple(&mut rand::rng(), chunk_size)
            .cloned()
            .collect();
        if cards.is_empty() {
            self.error = Some(AppError::EmptyDeck.to_string());
            return Err(AppError::EmptyDeck);
        }

        tracing::info!(deck = %deck_id, cards = cards.len(), "study session started");

        let screen = StudyScreen::new(cards, ContextFetcher::from_config(&self.config))
            .with_direction(self.config.default_direction);
        self.navigate(Page::Study { deck_id });

        Ok(self.study.insert(screen))
    }

    /// Forward a message to the study run, ending it when the screen asks to
    pub async fn update_study(
        &mut self,
        message: study::Message,
    ) -> Result<study::Action, AppError> {
        let study = self.study.as_mut().ok_or(AppError::NoSession)?;

        let action = study.update(message);
        match &action {
            study::Action::Completed(progress) | study::Action::End(progress) => {
                self.end_session(progress.clone()).await?;
            }
            study::Action::None | study::Action::Mastered => {}
        }

        Ok(action)
    }

    /// Merge the progress of a finished run into its deck and save it
    pub async fn end_session(&mut self, progress: Vec<Card>) -> Result<(), AppError> {
        let Page::Study { deck_id } = &self.page else {
            return Err(AppError::NoSession);
        };
        let deck_id = deck_id.clone();

        let Some(mut deck) = self.deck(&deck_id).cloned() else {
            self.study = None;
            self.navigate(Page::DeckList);
            return Err(AppError::DeckNotFound(deck_id));
        };

        let merged = deck.merge_progress(&progress);
        let deck = self
            .store
            .save(&self.scope, deck)
            .await
            .map_err(|e| self.store_failure(e))?;

        tracing::info!(deck = %deck_id, cards = merged, "study progress saved");

        if let Some(existing) = self.decks.iter_mut().find(|d| d.id == deck.id) {
            *existing = deck;
        }
        self.study = None;
        self.navigate(Page::DeckView(deck_id));

        Ok(())
    }

    //
    // Import
    //

    /// Copy every deck kept on this device into the current scope, all or nothing
    pub async fn import_device_decks(&mut self, source: &dyn DeckStore) -> Result<usize, AppError> {
        let decks = source
            .list(&Scope::Device)
            .await
            .map_err(|e| self.store_failure(e))?;
        if decks.is_empty() {
            return Ok(0);
        }

        let imported = self
            .store
            .import_many(&self.scope, decks.into_iter().map(NewDeck::from).collect())
            .await
            .map_err(|e| self.store_failure(e))?;

        tracing::info!(count = imported.len(), scope = %self.scope, "device decks imported");

        self.reload().await?;
        Ok(imported.len())
    }

    fn store_failure(&mut self, e: anywho::Error) -> AppError {
        tracing::error!("{e}");
        self.alert = Some(Alert::new(&e));
        AppError::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::core::store::{LocalDeckStore, MemoryStorage};
    use crate::app::core::store::local::{DECKS_STORAGE_KEY, LEGACY_STORAGE_KEY};
    use crate::app::core::store::KeyValueStorage;

    async fn app_with(storage: MemoryStorage) -> Databank {
        let store = Arc::new(LocalDeckStore::new(storage));
        Databank::init(store, Scope::Device, Config::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn legacy_cards_are_migrated_on_start() {
        let storage = MemoryStorage::default();
        storage
            .set(
                LEGACY_STORAGE_KEY,
                r#"[{"original":"der Berg","translation":"the mountain","progress":2}]"#,
            )
            .unwrap();

        let app = app_with(storage).await;
        assert_eq!(app.decks().len(), 1);
        assert_eq!(app.decks()[0].name, "My Imported Deck");
        assert_eq!(app.decks()[0].cards[0].progress, Some(2));
    }

    #[tokio::test]
    async fn stale_id_gives_inline_error() {
        let mut app = app_with(MemoryStorage::default()).await;
        assert!(matches!(
            app.open_deck("deck-missing"),
            Err(AppError::DeckNotFound(_))
        ));
        assert_eq!(app.error(), Some("Deck not found"));
        assert_eq!(app.page(), &Page::DeckList);
    }

    #[tokio::test]
    async fn invalid_input_keeps_editor_open() {
        let mut app = app_with(MemoryStorage::default()).await;
        app.new_deck();
        assert_eq!(app.editor_contents().1, utils::default_vocabulary());

        let err = app.save_deck("  ", "der Fluss, the river").await.unwrap_err();
        assert!(matches!(err, AppError::Input(DeckInputError::EmptyName)));

        let err = app.save_deck("Nature", "no comma here").await.unwrap_err();
        assert!(err.to_string().contains(utils::LINE_FORMAT));

        assert!(app.decks().is_empty());
        assert_eq!(app.page(), &Page::DeckEditor { deck_id: None });
    }

    #[tokio::test]
    async fn editing_keeps_surviving_progress() {
        let mut app = app_with(MemoryStorage::default()).await;
        app.new_deck();
        let deck = app
            .save_deck("Nature", "der Fluss, the river\ndas Tal, the valley")
            .await
            .unwrap();

        let mut progressed = deck.clone();
        progressed.cards[0].progress = Some(2);
        app.decks[0] = progressed.clone();

        app.edit_deck(&deck.id).unwrap();
        let (name, text) = app.editor_contents();
        assert_eq!(name, "Nature");
        assert_eq!(text, "der Fluss, the river\ndas Tal, the valley");

        let saved = app
            .save_deck("Nature 2", "der Fluss, the river\nder Berg, the mountain")
            .await
            .unwrap();
        assert_eq!(saved.id, deck.id);
        assert_eq!(saved.cards[0].progress, Some(2));
        assert_eq!(saved.cards[1].progress, None);
        assert_eq!(app.page(), &Page::DeckView(deck.id));
    }

    #[tokio::test]
    async fn empty_deck_has_no_session() {
        let storage = MemoryStorage::default();
        storage
            .set(DECKS_STORAGE_KEY, r#"[{"id":"deck-1","name":"Empty","cards":[]}]"#)
            .unwrap();
        let mut app = app_with(storage).await;

        app.open_deck("deck-1").unwrap();
        assert!(matches!(app.start_session(None), Err(AppError::EmptyDeck)));
        assert!(app.study().is_none());
    }

    #[tokio::test]
    async fn session_needs_an_open_deck() {
        let mut app = app_with(MemoryStorage::default()).await;
        let Err(err) = app.start_session(None) else {
            panic!("a session started without an open deck");
        };
        assert!(matches!(err, AppError::NoDeckOpen));
        assert_eq!(err.to_string(), "No databank is open");
        assert!(app.study().is_none());
    }

    #[tokio::test]
    async fn chunk_limits_session_size() {
        let mut app = app_with(MemoryStorage::default()).await;
        app.new_deck();
        let vocabulary = (0..30)
            .map(|i| format!("Wort {i}, word {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        app.save_deck("Big", &vocabulary).await.unwrap();

        let screen = app.start_session(Some(7)).unwrap();
        assert_eq!(screen.session().total(), 7);

        app.back().await.unwrap();
        app.start_session(None).unwrap();
        assert_eq!(app.study().unwrap().session().total(), 20);
    }

    #[tokio::test]
    async fn deleting_open_deck_returns_to_list() {
        let mut app = app_with(MemoryStorage::default()).await;
        app.new_deck();
        let deck = app.save_deck("Nature", "der Fluss, the river").await.unwrap();

        app.delete_deck(&deck.id).await.unwrap();
        assert!(app.decks().is_empty());
        assert_eq!(app.page(), &Page::DeckList);
    }

    #[tokio::test]
    async fn store_failure_raises_alert() {
        // Device storage refuses user scoped decks
        let store = Arc::new(LocalDeckStore::new(MemoryStorage::default()));
        let mut app = Databank {
            scope: Scope::User("ada".into()),
            ..Databank::init(store, Scope::Device, Config::default())
                .await
                .unwrap()
        };
        app.new_deck();

        let err = app.save_deck("Nature", "der Fluss, the river").await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(app.take_alert().is_some());
        assert!(app.decks().is_empty());
    }
}
