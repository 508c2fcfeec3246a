//! Key-value operations on the SQLite durable tier.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::store::DurableStore;
use crate::Error;

impl CacheDb {
    /// Get a stored value by key.
    ///
    /// Returns None if the key doesn't exist.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM kv_entries WHERE key = ?1")?;

                match stmt.query_row(params![key], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a value.
    ///
    /// When a quota is configured, inserting a new key into a full table
    /// fails with `Error::StorageFull`; overwriting an existing key always succeeds.
    pub async fn put_value(&self, key: &str, value: &str) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();
        let max_entries = self.max_entries;
        let updated_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                if let Some(max) = max_entries {
                    let exists: bool = conn.query_row(
                        "SELECT EXISTS(SELECT 1 FROM kv_entries WHERE key = ?1)",
                        params![key],
                        |row| row.get(0),
                    )?;
                    if !exists {
                        let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))?;
                        if count >= max as i64 {
                            return Err(Error::StorageFull(format!("durable store holds {count} of {max} entries")));
                        }
                    }
                }

                conn.execute(
                    "INSERT INTO kv_entries (key, value, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![key, value, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a value. Deleting a missing key is a no-op.
    ///
    /// Returns the number of deleted rows.
    pub async fn delete_value(&self, key: &str) -> Result<u64, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// All stored keys, oldest write first.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY updated_at ASC, key ASC")?;
                let keys = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored entries.
    pub async fn count(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl DurableStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.get_value(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.put_value(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.delete_value(key).await.map(|_| ())
    }

    async fn list_keys(&self) -> Result<Vec<String>, Error> {
        self.keys().await
    }
}
