// SPDX-License-Identifier: GPL-3.0

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use sqlx::{Pool, Row, Sqlite};

use super::{DeckStore, Scope};
use crate::app::core::models::{Card, Deck, NewDeck};

/// [`DeckStore`] keeping one collection of deck documents per user.
///
/// Each document is a row holding the deck id, its name and its cards as a JSON array.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: Arc<Pool<Sqlite>>,
}

impl DocumentStore {
    pub fn new(pool: Arc<Pool<Sqlite>>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<Pool<Sqlite>> {
        &self.pool
    }
}

fn user_id(scope: &Scope) -> Result<&str, anywho::Error> {
    scope
        .user_id()
        .ok_or_else(|| anywho::anywho!("User not authenticated"))
}

fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn cards_to_json(cards: &[Card]) -> Result<String, anywho::Error> {
    Ok(serde_json::to_string(cards)?)
}

#[async_trait]
impl DeckStore for DocumentStore {
    async fn list(&self, scope: &Scope) -> Result<Vec<Deck>, anywho::Error> {
        let user_id = user_id(scope)?;

        let mut rows = sqlx::query(
            "SELECT id, name, cards FROM decks WHERE user_id = $1 ORDER BY rowid ASC",
        )
        .bind(user_id)
        .fetch(self.pool.as_ref());

        let mut result = Vec::<Deck>::new();

        while let Some(row) = rows.try_next().await? {
            let id: String = row.try_get("id")?;
            let name: String = row.try_get("name")?;
            let cards: String = row.try_get("cards")?;

            let cards: Vec<Card> = match serde_json::from_str(&cards) {
                Ok(cards) => cards,
                Err(e) => {
                    tracing::warn!(deck = %id, "Failed to parse cards of deck: {e}");
                    Vec::new()
                }
            };

            result.push(Deck { id, name, cards });
        }

        Ok(result)
    }

    async fn create(&self, scope: &Scope, deck: NewDeck) -> Result<Deck, anywho::Error> {
        let user_id = user_id(scope)?;
        let deck = deck.into_deck(new_document_id());

        sqlx::query("INSERT INTO decks (user_id, id, name, cards) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(&deck.id)
            .bind(&deck.name)
            .bind(cards_to_json(&deck.cards)?)
            .execute(self.pool.as_ref())
            .await?;

        tracing::info!(deck = %deck.id, "deck document created");
        Ok(deck)
    }

    async fn save(&self, scope: &Scope, deck: Deck) -> Result<Deck, anywho::Error> {
        let user_id = user_id(scope)?;

        sqlx::query(
            "INSERT INTO decks (user_id, id, name, cards) VALUES (?, ?, ?, ?)
             ON CONFLICT (user_id, id) DO UPDATE SET name = excluded.name, cards = excluded.cards",
        )
        .bind(user_id)
        .bind(&deck.id)
        .bind(&deck.name)
        .bind(cards_to_json(&deck.cards)?)
        .execute(self.pool.as_ref())
        .await?;

        tracing::info!(deck = %deck.id, "deck document saved");
        Ok(deck)
    }

    async fn delete(&self, scope: &Scope, deck_id: &str) -> Result<(), anywho::Error> {
        let user_id = user_id(scope)?;

        sqlx::query("DELETE FROM decks WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(deck_id)
            .execute(self.pool.as_ref())
            .await?;

        tracing::info!(deck = %deck_id, "deck document deleted");
        Ok(())
    }

    async fn import_many(
        &self,
        scope: &Scope,
        decks: Vec<NewDeck>,
    ) -> Result<Vec<Deck>, anywho::Error> {
        let user_id = user_id(scope)?;
        if decks.is_empty() {
            return Ok(Vec::new());
        }

        let mut transaction = self.pool.begin().await?;
        let mut imported = Vec::with_capacity(decks.len());

        for deck in decks {
            let deck = deck.into_deck(new_document_id());

            sqlx::query("INSERT INTO decks (user_id, id, name, cards) VALUES (?, ?, ?, ?)")
                .bind(user_id)
                .bind(&deck.id)
                .bind(&deck.name)
                .bind(cards_to_json(&deck.cards)?)
                .execute(&mut *transaction)
                .await?;

            imported.push(deck);
        }

        transaction.commit().await?;

        tracing::info!(count = imported.len(), "deck documents imported");
        Ok(imported)
    }
}
