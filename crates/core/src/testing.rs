//! Shared test doubles.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::query::{Cursor, Document, Record};
use crate::source::{DataSource, DataSourceError, PageRequest};

/// An in-memory collection where the cursor after row `n` (1-based) is `c{n}`.
pub(crate) struct VecSource {
    records: Vec<Record>,
    calls: AtomicUsize,
    last_limit: AtomicUsize,
    yield_first: bool,
    failure: Option<DataSourceError>,
}

impl VecSource {
    /// Rows `w1..=wN`.
    pub fn widgets(n: usize) -> Self {
        let records = (1..=n)
            .map(|i| {
                let mut record = Record::new();
                record.insert("id".into(), json!(format!("w{i}")));
                record.insert("position".into(), json!(i));
                record
            })
            .collect();
        Self { records, calls: AtomicUsize::new(0), last_limit: AtomicUsize::new(0), yield_first: false, failure: None }
    }

    pub fn failing(error: DataSourceError) -> Self {
        Self { failure: Some(error), ..Self::widgets(0) }
    }

    /// Suspend once per call so concurrent callers interleave.
    pub fn yielding(mut self) -> Self {
        self.yield_first = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_limit(&self) -> usize {
        self.last_limit.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for VecSource {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Document>, DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(request.limit, Ordering::SeqCst);

        if self.yield_first {
            tokio::task::yield_now().await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let start = match request.cursor {
            Some(cursor) => cursor
                .as_str()
                .trim_start_matches('c')
                .parse::<usize>()
                .map_err(|_| DataSourceError::new("INVALID_ARGUMENT", format!("bad cursor {cursor}")))?,
            None => 0,
        };

        Ok(self
            .records
            .iter()
            .enumerate()
            .skip(start)
            .take(request.limit)
            .map(|(i, data)| Document { cursor: Cursor::new(format!("c{}", i + 1)), data: data.clone() })
            .collect())
    }
}

/// Ids of the records on a page, in order.
pub(crate) fn ids(items: &[Record]) -> Vec<String> {
    items.iter().filter_map(|r| r.get("id").and_then(|v| v.as_str()).map(str::to_string)).collect()
}
