//! Learning-path document store.
//!
//! One table, `learning_paths`, holding one record per learning path with a
//! unique `title` and a large `description` text blob. Records are created
//! and updated out of band (seed scripts, admin tooling); the service only
//! reads them. Lookups exist by `title` (prompt content) and by numeric id
//! (direct fetch), plus full enumeration.

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Errors produced by [`LearningPathStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No learning path matched the requested title or id.
    #[error("learning path not found")]
    NotFound,

    /// The supplied identifier is not a valid numeric id.
    #[error("invalid learning path id: {0}")]
    InvalidId(String),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One learning-path document.
///
/// `description` doubles as the tutoring system prompt material, so it is
/// typically a large text blob.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LearningPath {
    pub id: i64,
    pub title: String,
    pub description: String,
}

/// SQLite-backed store for learning paths.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct LearningPathStore {
    pool: SqlitePool,
}

impl LearningPathStore {
    /// Connects to the database at `url` (e.g. `sqlite://tutor.db` or
    /// `sqlite::memory:`), creating the file if missing.
    ///
    /// # Errors
    /// Returns [`StoreError::Database`] if the pool cannot be established.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(StoreError::Database)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!(%url, "learning-path store connected");
        Ok(Self { pool })
    }

    /// Creates the `learning_paths` table if it does not exist.
    ///
    /// Safe to call on every startup; content is seeded out of band.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS learning_paths (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetches one learning path by its unique title.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when no record matches.
    pub async fn find_by_title(&self, title: &str) -> Result<LearningPath, StoreError> {
        debug!(%title, "looking up learning path by title");
        sqlx::query_as::<_, LearningPath>(
            "SELECT id, title, description FROM learning_paths WHERE title = ?1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    /// Fetches one learning path by numeric id.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when no record matches.
    pub async fn find_by_id(&self, id: i64) -> Result<LearningPath, StoreError> {
        debug!(id, "looking up learning path by id");
        sqlx::query_as::<_, LearningPath>(
            "SELECT id, title, description FROM learning_paths WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    /// Fetches one learning path by its stringified id, as received over HTTP.
    ///
    /// # Errors
    /// [`StoreError::InvalidId`] when the string is not a number,
    /// [`StoreError::NotFound`] when no record matches.
    pub async fn find_by_id_str(&self, id: &str) -> Result<LearningPath, StoreError> {
        let id: i64 = id
            .trim()
            .parse()
            .map_err(|_| StoreError::InvalidId(id.to_string()))?;
        self.find_by_id(id).await
    }

    /// Returns all learning paths, ordered by id.
    pub async fn list_all(&self) -> Result<Vec<LearningPath>, StoreError> {
        let paths = sqlx::query_as::<_, LearningPath>(
            "SELECT id, title, description FROM learning_paths ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(paths)
    }

    /// Inserts or replaces a learning path by title. Used by seed tooling
    /// and tests; the request path never writes.
    pub async fn upsert(&self, title: &str, description: &str) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO learning_paths (title, description) VALUES (?1, ?2)
            ON CONFLICT(title) DO UPDATE SET description = excluded.description
            "#,
        )
        .bind(title)
        .bind(description)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> LearningPathStore {
        let store = LearningPathStore::connect("sqlite::memory:").await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn find_by_title_roundtrip() {
        let store = memory_store().await;
        store.upsert("Whatsapp", "Design a messaging system.").await.unwrap();

        let path = store.find_by_title("Whatsapp").await.unwrap();
        assert_eq!(path.title, "Whatsapp");
        assert_eq!(path.description, "Design a messaging system.");
    }

    #[tokio::test]
    async fn find_by_id_and_list() {
        let store = memory_store().await;
        let id = store.upsert("Whatsapp", "blob").await.unwrap();
        store.upsert("Dropbox", "another blob").await.unwrap();

        let path = store.find_by_id(id).await.unwrap();
        assert_eq!(path.title, "Whatsapp");

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn missing_title_is_not_found() {
        let store = memory_store().await;
        assert!(matches!(
            store.find_by_title("nope").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn bad_id_string_is_invalid() {
        let store = memory_store().await;
        assert!(matches!(
            store.find_by_id_str("abc123").await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn upsert_overwrites_by_title() {
        let store = memory_store().await;
        store.upsert("Whatsapp", "v1").await.unwrap();
        store.upsert("Whatsapp", "v2").await.unwrap();
        let path = store.find_by_title("Whatsapp").await.unwrap();
        assert_eq!(path.description, "v2");
    }
}
