//! Collection read response types and error mapping.

use qcache_core::{DataSourceError, Document};
use reqwest::StatusCode;
use serde::Deserialize;

/// Successful response body.
#[derive(Debug, Deserialize)]
pub struct CollectionResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Error body a backend may send with a non-2xx status.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Status code name for a non-2xx response without a usable error body.
pub fn code_for_status(status: StatusCode) -> &'static str {
    match status.as_u16() {
        401 | 403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        412 => "FAILED_PRECONDITION",
        429 => "RESOURCE_EXHAUSTED",
        500..=599 => "UNAVAILABLE",
        _ => "UNKNOWN",
    }
}

/// Build the error for a non-2xx response.
///
/// A JSON body carrying `code` takes precedence over the status mapping.
pub fn error_from_status(status: StatusCode, body: &[u8]) -> DataSourceError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();

    let code = parsed
        .code
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| code_for_status(status).to_string());
    let message = parsed.message.unwrap_or_else(|| format!("HTTP status {}", status.as_u16()));

    DataSourceError::new(code, message)
}

/// Parse a successful response body.
pub fn parse_documents(body: &[u8]) -> Result<Vec<Document>, DataSourceError> {
    let response: CollectionResponse = serde_json::from_slice(body)
        .map_err(|e| DataSourceError::new("DATA_LOSS", format!("malformed collection response: {e}")))?;
    Ok(response.documents)
}

/// Classify a transport-level failure.
pub fn error_from_transport(err: &reqwest::Error) -> DataSourceError {
    if err.is_timeout() {
        DataSourceError::deadline_exceeded(format!("request timed out: {err}"))
    } else if err.is_decode() {
        DataSourceError::new("DATA_LOSS", format!("failed to read response: {err}"))
    } else {
        DataSourceError::unavailable(format!("network error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIXTURE_JSON: &str = r#"{
        "documents": [
            {"cursor": "c1", "data": {"id": "f1", "amount": 40, "paid": false}},
            {"cursor": "c2", "data": {"id": "f2", "amount": "12.50", "paid": true}}
        ]
    }"#;

    #[test]
    fn test_parse_documents() {
        let documents = parse_documents(FIXTURE_JSON.as_bytes()).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].cursor.as_str(), "c1");
        assert_eq!(documents[0].data["amount"], json!(40));
        assert_eq!(documents[1].data["amount"], json!("12.50"));
    }

    #[test]
    fn test_parse_empty_and_missing_documents() {
        assert!(parse_documents(br#"{"documents": []}"#).unwrap().is_empty());
        assert!(parse_documents(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_body() {
        let err = parse_documents(b"<html>oops</html>").unwrap_err();
        assert_eq!(err.code, "DATA_LOSS");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(code_for_status(StatusCode::UNAUTHORIZED), "PERMISSION_DENIED");
        assert_eq!(code_for_status(StatusCode::FORBIDDEN), "PERMISSION_DENIED");
        assert_eq!(code_for_status(StatusCode::NOT_FOUND), "NOT_FOUND");
        assert_eq!(code_for_status(StatusCode::PRECONDITION_FAILED), "FAILED_PRECONDITION");
        assert_eq!(code_for_status(StatusCode::TOO_MANY_REQUESTS), "RESOURCE_EXHAUSTED");
        assert_eq!(code_for_status(StatusCode::BAD_GATEWAY), "UNAVAILABLE");
        assert_eq!(code_for_status(StatusCode::IM_A_TEAPOT), "UNKNOWN");
    }

    #[test]
    fn test_error_body_overrides_status() {
        let body = br#"{"code": "FAILED_PRECONDITION", "message": "The query requires an index"}"#;
        let err = error_from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.code, "FAILED_PRECONDITION");
        assert_eq!(err.message, "The query requires an index");
    }

    #[test]
    fn test_error_without_body() {
        let err = error_from_status(StatusCode::SERVICE_UNAVAILABLE, b"");
        assert_eq!(err.code, "UNAVAILABLE");
        assert_eq!(err.message, "HTTP status 503");

        let err = error_from_status(StatusCode::FORBIDDEN, br#"{"code": "", "message": "nope"}"#);
        assert_eq!(err.code, "PERMISSION_DENIED");
        assert_eq!(err.message, "nope");
    }
}
