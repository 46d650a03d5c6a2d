use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::Result;

/// Durable per-user key-value storage, the client-side analog of browser
/// local storage. One `kv` table, last-write-wins, no expiry, no eviction.
#[derive(Debug, Clone)]
pub struct LocalStore {
    database: SqlitePool,
}

/// Key for the explicit enrollment set of one user.
pub fn enrollments_key(user_id: i64) -> String {
    format!("user_{user_id}_active_enrollments")
}

/// Key for the completion percentage of one (user, course) pair.
pub fn percentage_key(user_id: i64, course_id: i64) -> String {
    format!("user_{user_id}_course_{course_id}_percentage")
}

/// Key for the completed-material set of one (user, course) pair.
pub fn progress_key(user_id: i64, course_id: i64) -> String {
    format!("user_{user_id}_course_{course_id}_progress")
}

impl LocalStore {
    pub async fn connect(url: &str) -> Result<Self> {
        // one connection: writes serialize, and an in-memory database stays
        // a single database instead of one per pooled connection
        let database = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;
        sqlx::query("CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&database)
            .await?;
        Ok(Self { database })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.database)
            .await?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.database)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.database)
            .await?;
        Ok(())
    }

    /// Read a json value; a missing key or an unreadable value both map to
    /// `None` so stale entries from older layouts can never wedge a caller.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).unwrap_or_default();
        self.set(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let store = LocalStore::in_memory().await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
        store.set("token", "abc").await.unwrap();
        store.set("token", "def").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), Some("def".to_string()));
        store.remove("token").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_values() {
        let store = LocalStore::in_memory().await.unwrap();
        let key = enrollments_key(3);
        store.set_json(&key, &vec![7i64, 9]).await.unwrap();
        let ids: Option<Vec<i64>> = store.get_json(&key).await.unwrap();
        assert_eq!(ids, Some(vec![7, 9]));

        // garbage from an older layout reads as absent, not as an error
        store.set(&key, "not json").await.unwrap();
        let ids: Option<Vec<i64>> = store.get_json(&key).await.unwrap();
        assert_eq!(ids, None);
    }

    #[tokio::test]
    async fn survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("sync.db").display());
        {
            let store = LocalStore::connect(&url).await.unwrap();
            store.set("user_1_course_2_percentage", "75").await.unwrap();
        }
        let store = LocalStore::connect(&url).await.unwrap();
        assert_eq!(
            store.get("user_1_course_2_percentage").await.unwrap(),
            Some("75".to_string())
        );
    }

    #[tokio::test]
    async fn key_layout() {
        assert_eq!(enrollments_key(5), "user_5_active_enrollments");
        assert_eq!(percentage_key(5, 12), "user_5_course_12_percentage");
        assert_eq!(progress_key(5, 12), "user_5_course_12_progress");
    }
}
