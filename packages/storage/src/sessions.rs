// ABOUTME: Session storage layer using SQLite
// ABOUTME: Opaque tokens mapped to workers, with a JSON bag for per-session state

use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::{StorageError, StorageResult};

pub struct SessionStorage {
    pool: SqlitePool,
}

impl SessionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a session for `worker_id` and return its opaque token.
    pub async fn create(&self, worker_id: &str) -> StorageResult<String> {
        let token = Uuid::new_v4().to_string();

        debug!("Creating session for worker {}", worker_id);

        sqlx::query("INSERT INTO sessions (token, worker_id, data, created_at) VALUES (?, ?, '{}', ?)")
            .bind(&token)
            .bind(worker_id)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(token)
    }

    /// Resolve a token to the worker id it authenticates.
    pub async fn worker_for(&self, token: &str) -> StorageResult<String> {
        sqlx::query_scalar("SELECT worker_id FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)
    }

    /// End a session. Deleting an unknown token is a no-op.
    pub async fn delete(&self, token: &str) -> StorageResult<()> {
        debug!("Deleting session");

        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Read a value out of the session's JSON bag.
    pub async fn get_value<T: DeserializeOwned>(
        &self,
        token: &str,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let data = self.load_data(token).await?;

        match data.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Store a value in the session's JSON bag, replacing any prior value
    /// under `key`.
    pub async fn set_value<T: Serialize>(
        &self,
        token: &str,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let mut data = self.load_data(token).await?;

        data.insert(key.to_string(), serde_json::to_value(value)?);
        self.store_data(token, &data).await
    }

    /// Drop a key from the session's JSON bag. Absent keys are a no-op.
    pub async fn remove_value(&self, token: &str, key: &str) -> StorageResult<()> {
        let mut data = self.load_data(token).await?;

        if data.remove(key).is_some() {
            self.store_data(token, &data).await?;
        }

        Ok(())
    }

    async fn load_data(
        &self,
        token: &str,
    ) -> StorageResult<serde_json::Map<String, serde_json::Value>> {
        let row = sqlx::query("SELECT data FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        let raw: String = row.try_get("data")?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;

        Ok(value.as_object().cloned().unwrap_or_default())
    }

    async fn store_data(
        &self,
        token: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> StorageResult<()> {
        let raw = serde_json::to_string(data)?;

        sqlx::query("UPDATE sessions SET data = ? WHERE token = ?")
            .bind(raw)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }
}
