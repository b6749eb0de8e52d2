use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_rusqlite::Connection;

use crate::error::Result;

use super::schema::SCHEMA;

/// Async key/value store. Values are JSON documents addressed by string keys.
#[derive(Clone)]
pub struct Store {
    conn: Connection,
}

impl Store {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let key = key.to_string();
        let raw = self
            .conn
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM kv_store WHERE key = ?1",
                        params![key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let key = key.to_string();
        let json = serde_json::to_string(value)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                       ON CONFLICT(key) DO UPDATE SET
                           value = excluded.value,
                           updated_at = datetime('now')"#,
                    params![key, json],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Removes every key in one batch. Missing keys are ignored.
    pub async fn remove(&self, keys: &[String]) -> Result<()> {
        let keys = keys.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for key in &keys {
                    tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = Store::open_in_memory().await.unwrap();
        let value: Option<Vec<String>> = store.get("researchTopics").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn set_overwrites_whole_value() {
        let store = Store::open_in_memory().await.unwrap();
        store.set("notes_a", "first").await.unwrap();
        store.set("notes_a", "second").await.unwrap();

        let value: Option<String> = store.get("notes_a").await.unwrap();
        assert_eq!(value.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn remove_drops_only_named_keys() {
        let store = Store::open_in_memory().await.unwrap();
        store.set("notes_a", "a").await.unwrap();
        store.set("sources_a", &vec![1, 2]).await.unwrap();
        store.set("notes_b", "b").await.unwrap();

        store
            .remove(&[
                "notes_a".to_string(),
                "sources_a".to_string(),
                "summaries_a".to_string(),
            ])
            .await
            .unwrap();

        assert!(store.get::<String>("notes_a").await.unwrap().is_none());
        assert!(store.get::<Vec<i32>>("sources_a").await.unwrap().is_none());
        assert_eq!(
            store.get::<String>("notes_b").await.unwrap().as_deref(),
            Some("b")
        );
    }

    #[tokio::test]
    async fn values_survive_reopening_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("research.db");
        let path = path.to_string_lossy().to_string();

        {
            let store = Store::open(&path).await.unwrap();
            store.set("notes_x", "kept").await.unwrap();
        }

        let store = Store::open(&path).await.unwrap();
        assert_eq!(
            store.get::<String>("notes_x").await.unwrap().as_deref(),
            Some("kept")
        );
    }
}
