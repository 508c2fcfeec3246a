//! SQLite handle for the durable tier.
//!
//! Every open goes through the same pragmas and the migration runner, so a
//! file database and an in-memory one behave alike apart from persistence.

use super::migrations;
use crate::Error;
use crate::config::AppConfig;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Applied on every connection before migrations run.
const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;
PRAGMA busy_timeout=5000;
PRAGMA temp_store=MEMORY;";

/// Durable-tier database.
///
/// Cloning is cheap: clones share one background connection thread.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
    pub(crate) max_entries: Option<usize>,
}

impl CacheDb {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open `db_path` with the `durable_max_entries` quota applied.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::open(&config.db_path).await?.with_max_entries(config.durable_max_entries))
    }

    /// Cap the number of stored entries.
    ///
    /// Writing a new key once the cap is reached fails with `Error::StorageFull`,
    /// the same way a browser's storage quota would.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS))
            .await
            .map_err(Error::Database)?;
        migrations::run(&conn).await?;
        Ok(Self { conn, max_entries: None })
    }
}
