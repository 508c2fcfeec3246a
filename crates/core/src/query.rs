//! Query options, pages and the rows that flow between the cache and a data source.
//!
//! Records are schema-less JSON maps. The cache never inspects or coerces their
//! values, so a field stored as the string `"5"` comes back as a string.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::Error;

/// Hard ceiling on items requested per call.
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size used when the caller does not set one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest array accepted by `in`, `not-in` and `array-contains-any` filters.
pub const MAX_FILTER_VALUES: usize = 30;

/// A schema-less row.
pub type Record = serde_json::Map<String, Value>;

static FIELD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("field path pattern is valid")
});

/// Clamp a requested page size into `[1, MAX_PAGE_SIZE]`.
pub fn clamp_read(raw_page_size: usize) -> usize {
    raw_page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Opaque pagination token. Only ever forwarded, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl Direction {
    /// Short wire form (`asc` / `desc`).
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(Error::InvalidOptions(format!("unknown order direction `{other}`"))),
        }
    }
}

/// Ordering of a collection read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self { field: field.into(), direction }
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        Self { field: "createdAt".to_string(), direction: Direction::Descending }
    }
}

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not-in")]
    NotIn,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "array-contains")]
    ArrayContains,
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,
}

impl FilterOp {
    /// Wire symbol for this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            FilterOp::Equals => "==",
            FilterOp::NotEquals => "!=",
            FilterOp::In => "in",
            FilterOp::NotIn => "not-in",
            FilterOp::GreaterThan => ">",
            FilterOp::GreaterThanOrEqual => ">=",
            FilterOp::LessThan => "<",
            FilterOp::LessThanOrEqual => "<=",
            FilterOp::ArrayContains => "array-contains",
            FilterOp::ArrayContainsAny => "array-contains-any",
        }
    }

    /// Operators whose value must be an array.
    fn takes_array(self) -> bool {
        matches!(self, FilterOp::In | FilterOp::NotIn | FilterOp::ArrayContainsAny)
    }
}

impl FromStr for FilterOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim() {
            "==" | "=" => FilterOp::Equals,
            "!=" => FilterOp::NotEquals,
            "in" => FilterOp::In,
            "not-in" => FilterOp::NotIn,
            ">" => FilterOp::GreaterThan,
            ">=" => FilterOp::GreaterThanOrEqual,
            "<" => FilterOp::LessThan,
            "<=" => FilterOp::LessThanOrEqual,
            "array-contains" => FilterOp::ArrayContains,
            "array-contains-any" => FilterOp::ArrayContainsAny,
            other => return Err(Error::InvalidOptions(format!("unknown filter operator `{other}`"))),
        };
        Ok(op)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single `(field, operator, value)` constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self { field: field.into(), op, value: value.into() }
    }

    /// Parse a filter whose operator arrives as text.
    pub fn parse(field: impl Into<String>, op: &str, value: Value) -> Result<Self, Error> {
        let filter = Self { field: field.into(), op: op.parse()?, value };
        filter.validate()?;
        Ok(filter)
    }

    /// Check the tuple is well formed.
    pub fn validate(&self) -> Result<(), Error> {
        if !FIELD_PATH.is_match(&self.field) {
            return Err(Error::InvalidOptions(format!("invalid filter field `{}`", self.field)));
        }

        if self.op.takes_array() {
            let Some(values) = self.value.as_array() else {
                return Err(Error::InvalidOptions(format!(
                    "filter `{}` with `{}` requires an array value",
                    self.field, self.op
                )));
            };
            if values.is_empty() || values.len() > MAX_FILTER_VALUES {
                return Err(Error::InvalidOptions(format!(
                    "filter `{}` with `{}` takes 1-{MAX_FILTER_VALUES} values, got {}",
                    self.field,
                    self.op,
                    values.len()
                )));
            }
        }

        Ok(())
    }
}

/// Options for a paginated collection read.
///
/// Filter order is preserved end to end; some backends only accept certain
/// filter combinations in a given order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub page_size: usize,
    #[serde(default)]
    pub cursor: Option<Cursor>,
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, cursor: None, order_by: OrderBy::default(), filters: Vec::new() }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_cursor(mut self, cursor: Option<Cursor>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_order(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = OrderBy::new(field, direction);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Validate everything that can be checked without I/O.
    pub fn validate(&self) -> Result<(), Error> {
        if !FIELD_PATH.is_match(&self.order_by.field) {
            return Err(Error::InvalidOptions(format!("invalid order field `{}`", self.order_by.field)));
        }
        for filter in &self.filters {
            filter.validate()?;
        }
        Ok(())
    }
}

/// A row as returned by a data source, paired with the cursor that points just past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub cursor: Cursor,
    pub data: Record,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Record>,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
    /// The clamped page size the read was bounded by. The source itself was
    /// asked for one look-ahead row more; see [`Page::upstream_limit`].
    pub requested_count: usize,
}

impl Page {
    /// Build a page from up to `page_size + 1` source rows.
    ///
    /// The extra look-ahead row only signals that more data exists; it is dropped,
    /// and the cursor points past the last row actually returned.
    pub fn from_documents(mut documents: Vec<Document>, page_size: usize) -> Self {
        let has_more = documents.len() > page_size;
        documents.truncate(page_size);
        let cursor = if has_more { documents.last().map(|d| d.cursor.clone()) } else { None };

        Self { items: documents.into_iter().map(|d| d.data).collect(), cursor, has_more, requested_count: page_size }
    }

    /// Row limit sent to the data source for this page.
    pub fn upstream_limit(&self) -> usize {
        self.requested_count + 1
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
