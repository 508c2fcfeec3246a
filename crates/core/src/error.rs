//! Unified error types for qcache.
//!
//! Every variant renders with a stable code prefix so callers (and the MCP
//! layer) can branch on the category without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

use crate::source::DataSourceError;

/// Unified error types for the query cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed query options (e.g., unknown filter operator, empty field name).
    ///
    /// Always raised before any I/O happens.
    #[error("INVALID_OPTIONS: {0}")]
    InvalidOptions(String),

    /// The upstream data source failed. Surfaced verbatim.
    #[error("DATA_SOURCE_ERROR: {0}")]
    DataSource(#[from] DataSourceError),

    /// A durable store write exceeded its capacity.
    #[error("STORAGE_FULL: {0}")]
    StorageFull(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A cache entry could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this is a capacity failure the cache recovers from by evicting.
    pub fn is_storage_full(&self) -> bool {
        matches!(self, Error::StorageFull(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e.into(),
            other => Error::Database(other),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(rusqlite::ErrorCode::DiskFull) {
            return Error::StorageFull(err.to_string());
        }
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidOptions(msg) => (-32602, msg.clone()),
            Error::DataSource(e) => (-32000, e.to_string()),
            Error::StorageFull(msg) => (-32002, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Serialization(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
