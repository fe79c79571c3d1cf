//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheGetParams, CacheListParams, CachePurgeParams, get_impl, list_impl, purge_impl},
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{SwActivateParams, SwMessageParams, activate_impl, install_impl, message_impl, state_impl},
    push::{SwNotificationClickParams, SwNotificationCloseParams, SwPushParams, click_impl, close_impl, push_impl},
};

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
use swcache_client::ServiceWorker;
use url::Url;

/// The main MCP server handler for swcache.
///
/// Every call drives the same intermediary instance, so lifecycle state and
/// partitions carry over between calls.
#[derive(Clone)]
pub struct SwCacheServer {
    worker: Arc<ServiceWorker>,
    origin: Url,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a constructed intermediary.
    pub fn new(worker: Arc<ServiceWorker>, origin: Url) -> Self {
        Self { worker, origin, tool_router: Self::tool_router() }
    }

    #[tool(description = "Install the intermediary: pre-cache the app shell into the current shell partition.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    /// Activation prunes partitions of earlier versions and claims the
    /// supplied windows.
    #[tool(description = "Activate the intermediary: delete stale partitions and claim the given open windows.")]
    async fn sw_activate(&self, params: Parameters<SwActivateParams>) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker, params.0).await
    }

    /// Route one intercepted request.
    ///
    /// Returns either a passthrough decision with its reason, or the response
    /// together with the strategy that produced it and where it came from.
    #[tool(description = "Intercept a request: classify it, then answer from network or cache with the source noted.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, &self.origin, params.0).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING or CLEAR_CACHE) to the intermediary.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push payload. Returns the notification that was shown.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Handle a notification click: focus a matching open window or open a new one.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report that a notification was dismissed without a click.")]
    async fn sw_notification_close(
        &self, params: Parameters<SwNotificationCloseParams>,
    ) -> Result<CallToolResult, McpError> {
        close_impl(&self.worker, params.0).await
    }

    #[tool(description = "Lifecycle state and stored partitions with their entry counts.")]
    async fn sw_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.worker).await
    }

    #[tool(description = "Read a stored response offline from the named partition, or else the current partitions.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, &self.origin, params.0).await
    }

    #[tool(description = "List the entries stored in a partition, newest first, without bodies.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(self.worker.partitions(), params.0).await
    }

    #[tool(description = "Purge entries of a partition by host and/or keep only the newest N entries.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.worker.partitions(), params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
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
