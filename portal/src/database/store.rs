//! Local key/value storage
//!
//! String-valued storage with last-write-wins semantics. Every mutation of
//! the app state is written through here immediately. Typed helpers read JSON
//! values and fall back to defaults when a stored value cannot be parsed.

use super::models::StorageEntry;
use crate::error::Result;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

/// Key/value store backed by the `kv` table
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a raw value
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Insert or overwrite a raw value
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored key '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    /// Remove a single key. Missing keys are ignored.
    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Wipe every key
    pub async fn clear(&self) -> Result<()> {
        let rows = sqlx::query("DELETE FROM kv")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!("Cleared local storage ({} keys)", rows);
        Ok(())
    }

    /// All stored entries ordered by key
    pub async fn entries(&self) -> Result<Vec<StorageEntry>> {
        let entries = sqlx::query_as::<_, StorageEntry>(
            "SELECT key, value, updated_at FROM kv ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Read a JSON value. Absent or malformed values yield `None`.
    pub async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Discarding malformed value for '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    /// Serialize a value as JSON and store it
    pub async fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_store() -> LocalStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        LocalStore::new(pool)
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let store = create_test_store().await;

        assert_eq!(store.get("lang").await.unwrap(), None);

        store.set("lang", "en").await.unwrap();
        store.set("lang", "bn").await.unwrap();

        assert_eq!(store.get("lang").await.unwrap().as_deref(), Some("bn"));
        assert_eq!(store.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = create_test_store().await;

        store.set("user", "{}").await.unwrap();
        store.set("teacher_notes", "hello").await.unwrap();
        store.set("lang", "bn").await.unwrap();

        store.remove("user").await.unwrap();
        store.remove("does-not-exist").await.unwrap();
        assert_eq!(store.get("user").await.unwrap(), None);

        store.clear().await.unwrap();
        assert!(store.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_json_malformed_is_discarded() {
        let store = create_test_store().await;

        store.set("routines", "[{not json").await.unwrap();

        let loaded: Option<Vec<String>> = store.load_json("routines").await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let store = create_test_store().await;

        store
            .save_json("routines", &vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        let loaded: Option<Vec<String>> = store.load_json("routines").await.unwrap();
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
