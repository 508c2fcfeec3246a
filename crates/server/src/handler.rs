//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::cache::{CacheInvalidateParams, invalidate_impl, stats_impl};
use crate::tools::fetch::{CollectionFetchParams, fetch_impl};

use qcache_core::QueryCache;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use std::sync::Arc;

/// The main MCP server handler for qcache.
#[derive(Clone)]
pub struct QcacheServer {
    cache: Arc<QueryCache>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl QcacheServer {
    /// Create a new server handler over a shared cache.
    pub fn new(cache: Arc<QueryCache>) -> Self {
        Self { cache, tool_router: Self::tool_router() }
    }

    /// Read one page of a collection.
    ///
    /// First pages are served from the cache while fresh; cursor pages always hit the backend.
    #[tool(
        description = "Read one page of a collection. Returns items, a cursor for the next page, has_more, and the cache key of first pages."
    )]
    async fn collection_fetch(&self, params: Parameters<CollectionFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.cache, params.0).await
    }

    #[tool(description = "Drop cached pages by key (\"*\" for all) or by collection.")]
    async fn cache_invalidate(&self, params: Parameters<CacheInvalidateParams>) -> Result<CallToolResult, McpError> {
        invalidate_impl(&self.cache, params.0).await
    }

    #[tool(description = "Report cache entry counts, hits, misses, evictions and hit rate.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.cache).await
    }
}

impl ServerHandler for QcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "qcache-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::cache;

    #[test]
    fn test_lists_all_tools() {
        let (cache, _) = cache();
        let server = QcacheServer::new(cache);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_invalidate", "cache_stats", "collection_fetch"]);
    }

    #[test]
    fn test_server_info() {
        let (cache, _) = cache();
        let info = QcacheServer::new(cache).get_info();
        assert_eq!(info.server_info.name, "qcache-mcp");
        assert!(info.capabilities.tools.is_some());
    }
}
