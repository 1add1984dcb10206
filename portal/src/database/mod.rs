//! Database module
//!
//! Local storage for the portal:
//! - Schema and migrations
//! - Model definitions
//! - Key/value store used by every service

pub mod models;
pub mod schema;
pub mod store;

pub use models::*;
pub use schema::initialize_database;
pub use store::LocalStore;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 4;

/// Open `portal.db` (creating it) and bring the kv schema up to date.
///
/// The path is passed as a filename rather than a URL, so directories
/// containing `?` or `#` are opened as-is.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening local storage at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    initialize_database(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pool_opens_path_with_url_characters() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("odd?dir#1").join("portal.db");

        let pool = create_pool(&db_path).await.unwrap();
        LocalStore::new(pool.clone()).set("lang", "bn").await.unwrap();
        pool.close().await;

        assert!(db_path.exists());

        let reopened = LocalStore::new(create_pool(&db_path).await.unwrap());
        assert_eq!(reopened.get("lang").await.unwrap().as_deref(), Some("bn"));
    }
}
