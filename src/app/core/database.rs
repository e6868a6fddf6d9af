// SPDX-License-Identifier: GPL-3.0

use std::{str::FromStr, sync::Arc};

use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// Init the document database and run its migrations
pub async fn init_database(url: &str) -> Result<Arc<Pool<Sqlite>>, anywho::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    // Every connection to an in-memory database sees its own empty database
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Document database ready");

    Ok(Arc::new(pool))
}
