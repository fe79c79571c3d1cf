//! MCP tool implementations.
//!
//! Each tool drives one host event on the shared [`ServiceWorker`] and
//! reports back what the intermediary did, including every window and
//! notification request it made of the host.
//!
//! [`ServiceWorker`]: swcache_client::ServiceWorker

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod push;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::WindowClient;
use swcache_core::{Error, Response};

/// An application window open in the calling host.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WindowParam {
    /// Host-assigned window id, echoed back in focus requests.
    pub id: String,
    /// Absolute URL currently shown in the window.
    pub url: String,
    #[serde(default)]
    pub focused: bool,
}

impl From<WindowParam> for WindowClient {
    fn from(window: WindowParam) -> Self {
        WindowClient { id: window.id, url: window.url, focused: window.focused }
    }
}

/// A response as reported to the caller. Bodies are decoded lossily.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseOutput {
    pub status: u16,
    pub status_text: String,
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub size_bytes: usize,
}

impl From<&Response> for ResponseOutput {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text.clone(),
            url: response.url.clone(),
            headers: response.headers.clone(),
            body: response.text(),
            size_bytes: response.body.len(),
        }
    }
}

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
