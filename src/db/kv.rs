use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::{db::Database, storage::KeyValueStore};

impl Database {
    pub async fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .with_context(|| format!("failed to read key '{key}'"))?;
            Ok(value)
        })
        .await
    }

    /// Single-statement upsert; either the whole value lands or nothing does.
    pub async fn kv_set(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to write key '{key}'"))?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.kv_get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.kv_set(key, value).await
    }
}
