//! sw_fetch tool implementation.
//!
//! Runs one intercepted request through classification and the matching
//! strategy, exactly as a page load would.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{FetchDecision, PassReason, ResponseSource, ServiceWorker, Strategy, canonicalize};
use swcache_core::{Error, InterceptedRequest, RequestMode};
use url::Url;

use super::{ResponseOutput, json_result};

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// Fetch mode reported by the page (default: cors).
    #[serde(default)]
    pub mode: RequestMode,

    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the sw_fetch tool.
#[derive(Debug, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SwFetchOutput {
    /// The request goes to the network untouched.
    Passthrough { reason: PassReason },
    Respond {
        strategy: Strategy,
        source: ResponseSource,
        /// A background refresh was started for this request.
        revalidating: bool,
        response: ResponseOutput,
    },
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(
    worker: &ServiceWorker, origin: &Url, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = canonicalize(&params.url, origin).map_err(Error::from)?;
    let request = InterceptedRequest::new(&params.method, url, params.mode).with_headers(params.headers);

    let output = match worker.on_fetch(&request).await? {
        FetchDecision::Passthrough(reason) => SwFetchOutput::Passthrough { reason },
        FetchDecision::Respond(outcome) => {
            // The refresh outlives this call and finishes on its own.
            let revalidating = outcome.revalidation.is_some();
            SwFetchOutput::Respond {
                strategy: outcome.strategy,
                source: outcome.source,
                revalidating,
                response: ResponseOutput::from(&outcome.response),
            }
        }
    };

    json_result(&output)
}
