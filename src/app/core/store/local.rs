// SPDX-License-Identifier: GPL-3.0

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;

use super::{DeckStore, Scope};
use crate::app::core::{
    models::{Card, Deck, NewDeck},
    utils,
};

/// Key holding the JSON array of every device [`Deck`]
pub const DECKS_STORAGE_KEY: &str = "flashcard-decks";
/// Key of the flat card array written by versions that had no decks
pub const LEGACY_STORAGE_KEY: &str = "vocab-cards";
/// Name given to the deck built from legacy cards
pub const IMPORTED_DECK_NAME: &str = "My Imported Deck";

/// String key-value storage of the device
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, anywho::Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), anywho::Error>;
    fn remove(&self, key: &str) -> Result<(), anywho::Error>;
}

/// [`KeyValueStorage`] keeping one file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open the storage in the application data directory
    pub fn open() -> Result<Self, anywho::Error> {
        Self::at(utils::data_dir()?.join("storage"))
    }

    /// Open the storage in the given directory, creating it if needed
    pub fn at<P: AsRef<Path>>(dir: P) -> Result<Self, anywho::Error> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, anywho::Error> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), anywho::Error> {
        // Write next to the target and rename so a crash never leaves half a file
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), anywho::Error> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory [`KeyValueStorage`], nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, anywho::Error> {
        self.values
            .lock()
            .map_err(|_| anywho::anywho!("Memory storage lock poisoned"))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, anywho::Error> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), anywho::Error> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), anywho::Error> {
        self.values()?.remove(key);
        Ok(())
    }
}

/// [`DeckStore`] for [`Scope::Device`], all decks live in one JSON array of the device storage
pub struct LocalDeckStore<S> {
    storage: S,
    /// Serializes read-modify-write cycles on the deck array
    write_lock: tokio::sync::Mutex<()>,
}

impl<S: KeyValueStorage> LocalDeckStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read every deck. Data that does not parse counts as no decks, a failing read is an error.
    fn read_decks(&self) -> Result<Vec<Deck>, anywho::Error> {
        let Some(raw) = self.storage.get(DECKS_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse decks from device storage: {e}");
            Vec::new()
        }))
    }

    fn write_decks(&self, decks: &[Deck]) -> Result<(), anywho::Error> {
        let json = serde_json::to_string(decks)?;
        self.storage.set(DECKS_STORAGE_KEY, &json)
    }
}

fn new_deck_id() -> String {
    format!("deck-{}", uuid::Uuid::new_v4())
}

fn check_scope(scope: &Scope) -> Result<(), anywho::Error> {
    match scope {
        Scope::Device => Ok(()),
        Scope::User(_) => Err(anywho::anywho!(
            "Device storage only holds decks of the device, not of {}",
            scope
        )),
    }
}

#[async_trait]
impl<S: KeyValueStorage> DeckStore for LocalDeckStore<S> {
    async fn list(&self, scope: &Scope) -> Result<Vec<Deck>, anywho::Error> {
        check_scope(scope)?;
        self.read_decks()
    }

    async fn create(&self, scope: &Scope, deck: NewDeck) -> Result<Deck, anywho::Error> {
        check_scope(scope)?;
        let _guard = self.write_lock.lock().await;

        let mut decks = self.read_decks()?;
        let deck = deck.into_deck(new_deck_id());
        decks.push(deck.clone());
        self.write_decks(&decks)?;

        tracing::info!(deck = %deck.id, "deck created on device");
        Ok(deck)
    }

    async fn save(&self, scope: &Scope, deck: Deck) -> Result<Deck, anywho::Error> {
        check_scope(scope)?;
        let _guard = self.write_lock.lock().await;

        let mut decks = self.read_decks()?;
        match decks.iter_mut().find(|d| d.id == deck.id) {
            Some(existing) => *existing = deck.clone(),
            None => decks.push(deck.clone()),
        }
        self.write_decks(&decks)?;

        tracing::info!(deck = %deck.id, "deck saved on device");
        Ok(deck)
    }

    async fn delete(&self, scope: &Scope, deck_id: &str) -> Result<(), anywho::Error> {
        check_scope(scope)?;
        let _guard = self.write_lock.lock().await;

        let mut decks = self.read_decks()?;
        decks.retain(|d| d.id != deck_id);
        self.write_decks(&decks)?;

        tracing::info!(deck = %deck_id, "deck deleted from device");
        Ok(())
    }

    async fn import_many(
        &self,
        scope: &Scope,
        decks: Vec<NewDeck>,
    ) -> Result<Vec<Deck>, anywho::Error> {
        check_scope(scope)?;
        if decks.is_empty() {
            return Ok(Vec::new());
        }
        let _guard = self.write_lock.lock().await;

        let imported: Vec<Deck> = decks
            .into_iter()
            .map(|d| d.into_deck(new_deck_id()))
            .collect();

        // One write for the whole batch
        let mut all = self.read_decks()?;
        all.extend(imported.iter().cloned());
        self.write_decks(&all)?;

        tracing::info!(count = imported.len(), "decks imported on device");
        Ok(imported)
    }

    async fn migrate_legacy(&self, scope: &Scope) -> Result<Option<Deck>, anywho::Error> {
        check_scope(scope)?;

        let raw = match self.storage.get(LEGACY_STORAGE_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let cards: Vec<Card> = match serde_json::from_str(&raw) {
            Ok(cards) => cards,
            Err(e) => {
                tracing::warn!("Failed to migrate old vocabulary data: {e}");
                self.storage.remove(LEGACY_STORAGE_KEY)?;
                return Ok(None);
            }
        };
        if cards.is_empty() {
            self.storage.remove(LEGACY_STORAGE_KEY)?;
            return Ok(None);
        }

        tracing::info!(cards = cards.len(), "migrating legacy vocabulary");
        let deck = self
            .create(
                scope,
                NewDeck {
                    name: IMPORTED_DECK_NAME.to_string(),
                    cards,
                },
            )
            .await?;
        // Only drop the legacy cards once they live in a deck
        self.storage.remove(LEGACY_STORAGE_KEY)?;
        Ok(Some(deck))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LocalDeckStore<MemoryStorage> {
        LocalDeckStore::new(MemoryStorage::default())
    }

    fn new_deck(name: &str) -> NewDeck {
        NewDeck {
            name: name.to_string(),
            cards: vec![Card::new("der Fluss", "the river")],
        }
    }

    #[tokio::test]
    async fn create_save_delete() {
        let store = store();
        let scope = Scope::Device;

        let deck = store.create(&scope, new_deck("Nature")).await.unwrap();
        assert!(deck.id.starts_with("deck-"));

        let mut renamed = deck.clone();
        renamed.name = "Landscape".into();
        store.save(&scope, renamed).await.unwrap();

        let decks = store.list(&scope).await.unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].name, "Landscape");

        store.delete(&scope, &deck.id).await.unwrap();
        assert!(store.list(&scope).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_unknown_id_appends() {
        let store = store();
        let deck = Deck {
            id: "deck-elsewhere".into(),
            name: "Elsewhere".into(),
            cards: vec![],
        };
        store.save(&Scope::Device, deck).await.unwrap();
        assert_eq!(store.list(&Scope::Device).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_data_reads_as_empty() {
        let store = store();
        store.storage().set(DECKS_STORAGE_KEY, "{not json").unwrap();
        assert!(store.list(&Scope::Device).await.unwrap().is_empty());
    }

    /// Storage whose reads can be switched off
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        reads_fail: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStorage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, anywho::Error> {
            if self.reads_fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(anywho::anywho!("storage unavailable"));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), anywho::Error> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), anywho::Error> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn failing_read_keeps_stored_decks() {
        let store = LocalDeckStore::new(FlakyStorage::default());
        let scope = Scope::Device;
        store.create(&scope, new_deck("A")).await.unwrap();
        store.create(&scope, new_deck("B")).await.unwrap();

        store
            .storage()
            .reads_fail
            .store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(store.list(&scope).await.is_err());
        assert!(store.create(&scope, new_deck("C")).await.is_err());
        assert!(store.import_many(&scope, vec![new_deck("D")]).await.is_err());
        assert!(store.delete(&scope, "deck-any").await.is_err());

        store
            .storage()
            .reads_fail
            .store(false, std::sync::atomic::Ordering::SeqCst);
        let names: Vec<String> = store
            .list(&scope)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn rejects_user_scope() {
        let store = store();
        let scope = Scope::User("someone".into());
        assert!(store.list(&scope).await.is_err());
        assert!(store.create(&scope, new_deck("x")).await.is_err());
    }

    #[tokio::test]
    async fn legacy_cards_migrate_once() {
        let store = store();
        store
            .storage()
            .set(
                LEGACY_STORAGE_KEY,
                r#"[{"original":"der Berg","translation":"the mountain"}]"#,
            )
            .unwrap();

        let deck = store.migrate_legacy(&Scope::Device).await.unwrap().unwrap();
        assert_eq!(deck.name, IMPORTED_DECK_NAME);
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(store.storage().get(LEGACY_STORAGE_KEY).unwrap(), None);

        assert!(store.migrate_legacy(&Scope::Device).await.unwrap().is_none());
        assert_eq!(store.list(&Scope::Device).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn broken_legacy_data_is_dropped() {
        let store = store();
        store.storage().set(LEGACY_STORAGE_KEY, "oops").unwrap();

        assert!(store.migrate_legacy(&Scope::Device).await.unwrap().is_none());
        assert_eq!(store.storage().get(LEGACY_STORAGE_KEY).unwrap(), None);
        assert!(store.list(&Scope::Device).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_many_assigns_fresh_ids() {
        let store = store();
        let imported = store
            .import_many(&Scope::Device, vec![new_deck("A"), new_deck("B")])
            .await
            .unwrap();
        assert_eq!(imported.len(), 2);
        assert_ne!(imported[0].id, imported[1].id);
        assert_eq!(store.list(&Scope::Device).await.unwrap(), imported);
    }

    #[test]
    fn file_storage_round_trips_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::at(dir.path().join("nested")).unwrap();

        assert_eq!(storage.get("missing").unwrap(), None);
        storage.set("key", "[1,2]").unwrap();
        assert_eq!(storage.get("key").unwrap().as_deref(), Some("[1,2]"));
        storage.remove("key").unwrap();
        assert_eq!(storage.get("key").unwrap(), None);
        storage.remove("key").unwrap();
    }
}
