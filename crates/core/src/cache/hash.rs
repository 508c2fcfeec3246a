//! Content-addressed cache key generation.

use sha2::{Digest, Sha256};

use crate::query::QueryOptions;

/// Compute the cache key for a first-page read.
///
/// `page_size` must already be clamped. The cursor is never part of the key;
/// only first pages are cached.
pub fn compute_cache_key(collection_path: &str, page_size: usize, options: &QueryOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(collection_path.as_bytes());
    hasher.update(b"\n");
    hasher.update(page_size.to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(options.order_by.field.as_bytes());
    hasher.update(b"\n");
    hasher.update(options.order_by.direction.as_str().as_bytes());
    for filter in &options.filters {
        hasher.update(b"\n");
        hasher.update(filter.field.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(filter.op.symbol().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(filter.value.to_string().as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Cursor, Direction, Filter, FilterOp};
    use serde_json::json;

    #[test]
    fn test_hash_stability() {
        let options = QueryOptions::new().with_filter(Filter::new("status", FilterOp::Equals, "open"));
        let hash1 = compute_cache_key("fines", 20, &options);
        let hash2 = compute_cache_key("fines", 20, &options);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_ignores_cursor() {
        let first = QueryOptions::new();
        let later = QueryOptions::new().with_cursor(Some(Cursor::new("c3")));
        assert_eq!(compute_cache_key("fines", 20, &first), compute_cache_key("fines", 20, &later));
    }

    #[test]
    fn test_hash_different_page_size() {
        let options = QueryOptions::new();
        assert_ne!(compute_cache_key("fines", 10, &options), compute_cache_key("fines", 20, &options));
    }

    #[test]
    fn test_hash_different_order() {
        let asc = QueryOptions::new().with_order("createdAt", Direction::Ascending);
        let desc = QueryOptions::new().with_order("createdAt", Direction::Descending);
        assert_ne!(compute_cache_key("fines", 20, &asc), compute_cache_key("fines", 20, &desc));
    }

    #[test]
    fn test_hash_filter_order_matters() {
        let a = Filter::new("status", FilterOp::Equals, "open");
        let b = Filter::new("amount", FilterOp::GreaterThan, 100);
        let ab = QueryOptions::new().with_filter(a.clone()).with_filter(b.clone());
        let ba = QueryOptions::new().with_filter(b).with_filter(a);
        assert_ne!(compute_cache_key("fines", 20, &ab), compute_cache_key("fines", 20, &ba));
    }

    #[test]
    fn test_hash_distinguishes_value_types() {
        let as_string = QueryOptions::new().with_filter(Filter::new("unit", FilterOp::Equals, json!("5")));
        let as_number = QueryOptions::new().with_filter(Filter::new("unit", FilterOp::Equals, json!(5)));
        assert_ne!(compute_cache_key("residents", 20, &as_string), compute_cache_key("residents", 20, &as_number));
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("fines", 20, &QueryOptions::new());
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
