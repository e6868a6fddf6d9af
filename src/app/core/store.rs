// SPDX-License-Identifier: GPL-3.0

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::core::{
    config::{Config, StorageBackend},
    database,
    models::{Deck, NewDeck},
};

pub mod document;
pub mod local;

pub use document::DocumentStore;
pub use local::{FileStorage, KeyValueStorage, LocalDeckStore, MemoryStorage};

/// Owner of a collection of decks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Decks saved on this device only
    Device,
    /// Decks of an authenticated user, the value is the user identifier
    User(String),
}

impl Scope {
    /// The user identifier, if the scope belongs to a user
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Scope::Device => None,
            Scope::User(id) => Some(id),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Scope::Device => write!(f, "device"),
            Scope::User(id) => write!(f, "user {id}"),
        }
    }
}

/// Persistence of [`Deck`]s, injected into the application root.
///
/// Every operation may fail with a connectivity or permission error; callers must keep their
/// in-memory state as it was when that happens.
#[async_trait]
pub trait DeckStore: Send + Sync {
    /// Get all [`Deck`]s of the scope
    async fn list(&self, scope: &Scope) -> Result<Vec<Deck>, anywho::Error>;

    /// Store a new [`Deck`] under a fresh identifier
    async fn create(&self, scope: &Scope, deck: NewDeck) -> Result<Deck, anywho::Error>;

    /// Upsert a [`Deck`] by identifier, replacing its name and cards
    async fn save(&self, scope: &Scope, deck: Deck) -> Result<Deck, anywho::Error>;

    /// Delete a [`Deck`] by identifier
    async fn delete(&self, scope: &Scope, deck_id: &str) -> Result<(), anywho::Error>;

    /// Store many decks at once, each under a fresh identifier. Either all of them are stored
    /// or none is.
    async fn import_many(
        &self,
        scope: &Scope,
        decks: Vec<NewDeck>,
    ) -> Result<Vec<Deck>, anywho::Error>;

    /// Turn data left behind by older versions into a [`Deck`], at most once
    async fn migrate_legacy(&self, _scope: &Scope) -> Result<Option<Deck>, anywho::Error> {
        Ok(None)
    }
}

/// Open the backend selected in `config`
pub async fn open(config: &Config) -> Result<Arc<dyn DeckStore>, anywho::Error> {
    match config.storage {
        StorageBackend::Device => Ok(Arc::new(LocalDeckStore::new(FileStorage::open()?))),
        StorageBackend::Cloud => {
            let url = config
                .document_store_url()
                .ok_or_else(|| anywho::anywho!("No document store url configured"))?;
            let pool = database::init_database(url).await?;
            Ok(Arc::new(DocumentStore::new(pool)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cloud_backend_opens_document_store() {
        let config = Config {
            storage: StorageBackend::Cloud,
            document_store_url: Some("sqlite::memory:".into()),
            ..Config::default()
        };
        let store = open(&config).await.unwrap();
        let scope = Scope::User("ada".into());

        assert!(store.list(&scope).await.unwrap().is_empty());
        assert!(store.list(&Scope::Device).await.is_err());
    }

    #[tokio::test]
    async fn cloud_backend_needs_url() {
        let config = Config {
            storage: StorageBackend::Cloud,
            ..Config::default()
        };
        assert!(open(&config).await.is_err());
    }
}
