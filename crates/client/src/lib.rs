//! Client code for qcache.
//!
//! This crate provides the HTTP data source the server reads collections
//! through, mapping transport and status failures onto `DataSourceError`.

pub mod http;

pub use http::{ClientError, CollectionQuery, HttpDataSource, HttpSourceConfig};
