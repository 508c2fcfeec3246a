//! The paginated collection backend the cache reads through to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::query::{Cursor, Document, Filter, OrderBy};

/// An upstream fetch failure, surfaced to callers unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct DataSourceError {
    /// Backend status code, e.g. `PERMISSION_DENIED`, `FAILED_PRECONDITION`, `UNAVAILABLE`.
    pub code: String,
    pub message: String,
}

impl DataSourceError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }

    /// The call did not finish within its deadline.
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new("DEADLINE_EXCEEDED", message)
    }

    /// The backend could not be reached.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("UNAVAILABLE", message)
    }
}

/// What the cache asks a data source for.
///
/// `limit` is already bounded; the cache requests one row more than the page
/// it will return so it can tell whether another page exists.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub collection_path: &'a str,
    pub limit: usize,
    pub cursor: Option<&'a Cursor>,
    pub order_by: &'a OrderBy,
    pub filters: &'a [Filter],
}

/// A paginated collection backend.
///
/// Implementations return at most `request.limit` documents in source order,
/// starting just after `request.cursor` when one is given.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Document>, DataSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_error_display() {
        let err = DataSourceError::new("FAILED_PRECONDITION", "query requires an index");
        assert_eq!(err.to_string(), "FAILED_PRECONDITION: query requires an index");
        assert_eq!(DataSourceError::deadline_exceeded("slow").code, "DEADLINE_EXCEEDED");
    }
}
