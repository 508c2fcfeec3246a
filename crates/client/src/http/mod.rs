//! HTTP-backed collection data source.
//!
//! ### Wire format
//!
//! - **Request**: `GET {base_url}/{collection_path}` with `limit`, `cursor`,
//!   `order_by`, `direction` and `filters` (JSON array) query parameters.
//! - **Response**: `{"documents": [{"cursor": "..", "data": {..}}]}`, in source order.
//! - **Errors**: non-2xx responses map to `DataSourceError` codes, preferring a
//!   `{"code", "message"}` body when the backend sends one.

pub mod error;
pub mod request;
pub mod response;

pub use error::ClientError;
pub use request::{CollectionQuery, collection_url};

use async_trait::async_trait;
use qcache_core::{AppConfig, DataSource, DataSourceError, Document, PageRequest};
use reqwest::header;
use std::time::{Duration, Instant};
use url::Url;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "qcache/0.1";

/// HTTP data source configuration.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL collections are resolved beneath.
    pub base_url: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User-agent string (default: qcache/0.x).
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpSourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Take base URL, timeout and user agent from the application config.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ClientError> {
        let base_url = config
            .require_source_base_url()
            .map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self {
            base_url: base_url.to_string(),
            timeout: config.source_timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Reads collection pages from an HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    http: reqwest::Client,
    base_url: Url,
    config: HttpSourceConfig,
}

impl HttpDataSource {
    /// Create a new data source with the given configuration.
    pub fn new(config: HttpSourceConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;
        match base_url.scheme() {
            "http" | "https" => {}
            other => return Err(ClientError::InvalidBaseUrl(format!("unsupported scheme: {other}"))),
        }
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self { http, base_url, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    /// Build the HTTP request for one page read without sending it.
    pub fn build_request(&self, request: &PageRequest<'_>) -> Result<reqwest::Request, DataSourceError> {
        let url = collection_url(&self.base_url, request.collection_path)?;
        let query = CollectionQuery::from_request(request)?;

        self.http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .query(&query)
            .build()
            .map_err(|e| DataSourceError::new("INVALID_ARGUMENT", format!("failed to build request: {e}")))
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Document>, DataSourceError> {
        let http_request = self.build_request(request)?;
        let start = Instant::now();

        tracing::debug!(
            collection = request.collection_path,
            limit = request.limit,
            url = %http_request.url(),
            "reading collection page"
        );

        let http_response = self
            .http
            .execute(http_request)
            .await
            .map_err(|e| response::error_from_transport(&e))?;

        let status = http_response.status();
        let body = http_response
            .bytes()
            .await
            .map_err(|e| response::error_from_transport(&e))?;

        if !status.is_success() {
            let err = response::error_from_status(status, &body);
            tracing::debug!(status = status.as_u16(), code = %err.code, "collection read rejected");
            return Err(err);
        }

        let documents = response::parse_documents(&body)?;
        tracing::debug!(
            "read {} documents from {} in {:?}",
            documents.len(),
            request.collection_path,
            start.elapsed()
        );

        Ok(documents)
    }
}
