//! Collection read request encoding.

use qcache_core::{DataSourceError, PageRequest};
use serde::Serialize;
use url::Url;

/// Query string sent with every collection read.
///
/// `GET {base}/{collection}?limit=N&cursor=..&order_by=F&direction=asc|desc&filters=JSON`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionQuery {
    pub limit: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    pub order_by: String,

    pub direction: &'static str,

    /// Filters as a JSON array of `{"field","op","value"}`, in caller order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
}

impl CollectionQuery {
    pub fn from_request(request: &PageRequest<'_>) -> Result<Self, DataSourceError> {
        let filters = if request.filters.is_empty() {
            None
        } else {
            let encoded = serde_json::to_string(request.filters)
                .map_err(|e| DataSourceError::new("INVALID_ARGUMENT", format!("unencodable filters: {e}")))?;
            Some(encoded)
        };

        Ok(Self {
            limit: request.limit,
            cursor: request.cursor.map(|c| c.as_str().to_string()),
            order_by: request.order_by.field.clone(),
            direction: request.order_by.direction.as_str(),
            filters,
        })
    }
}

/// Resolve `collection_path` beneath `base`.
///
/// Each `/`-separated segment is percent-encoded on its own, so ids with
/// reserved characters cannot escape the collection.
pub fn collection_url(base: &Url, collection_path: &str) -> Result<Url, DataSourceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DataSourceError::new("INVALID_ARGUMENT", format!("base URL {base} cannot have a path")))?
        .pop_if_empty()
        .extend(collection_path.split('/').filter(|s| !s.is_empty()));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcache_core::{Cursor, Direction, Filter, FilterOp, OrderBy};
    use serde_json::json;

    #[test]
    fn test_query_from_first_page_request() {
        let order = OrderBy::default();
        let request = PageRequest { collection_path: "fines", limit: 21, cursor: None, order_by: &order, filters: &[] };

        let query = CollectionQuery::from_request(&request).unwrap();
        assert_eq!(query.limit, 21);
        assert_eq!(query.cursor, None);
        assert_eq!(query.order_by, "createdAt");
        assert_eq!(query.direction, "desc");
        assert_eq!(query.filters, None);
    }

    #[test]
    fn test_query_keeps_filter_order() {
        let order = OrderBy::new("amount", Direction::Ascending);
        let cursor = Cursor::new("c20");
        let filters = vec![
            Filter::new("status", FilterOp::Equals, json!("open")),
            Filter::new("amount", FilterOp::GreaterThan, json!(10)),
        ];
        let request =
            PageRequest { collection_path: "fines", limit: 6, cursor: Some(&cursor), order_by: &order, filters: &filters };

        let query = CollectionQuery::from_request(&request).unwrap();
        assert_eq!(query.cursor.as_deref(), Some("c20"));
        assert_eq!(query.direction, "asc");

        let decoded: serde_json::Value = serde_json::from_str(query.filters.as_deref().unwrap()).unwrap();
        assert_eq!(decoded[0]["field"], "status");
        assert_eq!(decoded[0]["op"], "==");
        assert_eq!(decoded[1]["field"], "amount");
        assert_eq!(decoded[1]["op"], ">");
    }

    #[test]
    fn test_collection_url() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();
        let url = collection_url(&base, "users/alice/fines").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/alice/fines");

        let base = Url::parse("https://api.example.com/v1").unwrap();
        let url = collection_url(&base, "/complaints").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/complaints");
    }

    #[test]
    fn test_collection_url_encodes_segments() {
        let base = Url::parse("https://api.example.com/").unwrap();
        let url = collection_url(&base, "users/a b?c/fines").unwrap();
        assert_eq!(url.path(), "/users/a%20b%3Fc/fines");
        assert!(url.query().is_none());
    }
}
