//! Structured errors for the qcache MCP server.
//!
//! Engine errors convert through `qcache_core::Error`; these cover tool
//! arguments the engine never sees.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the qcache MCP server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid tool arguments (e.g., no invalidation target).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A result could not be rendered as JSON.
    #[error("OUTPUT_FAILED: {0}")]
    OutputFailed(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(_) => (-32602, err.to_string()),
            ToolError::OutputFailed(_) => (-32603, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

/// Render `value` as the single text content of a successful tool result.
pub fn json_result<T: serde::Serialize>(value: &T) -> Result<rmcp::model::CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ToolError::OutputFailed(e.to_string()))?;
    Ok(rmcp::model::CallToolResult::success(vec![rmcp::model::Content::text(json)]))
}
