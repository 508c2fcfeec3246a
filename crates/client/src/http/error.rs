//! HTTP data source setup errors.

use std::sync::Arc;

/// Errors raised while building an `HttpDataSource`.
///
/// Failures of individual reads are reported as `DataSourceError` instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The configured base URL is not an absolute http(s) URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Build(Arc::new(err))
    }
}
