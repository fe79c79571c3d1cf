//! cache_get tool implementation.
//!
//! Reads one stored response without touching the network.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ServiceWorker, canonicalize};
use swcache_core::{Error, InterceptedRequest, RequestMode};
use url::Url;

use super::resolve_partition;
use crate::tools::{ResponseOutput, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Partition kind (`shell`, `runtime`, `api`) or full partition name.
    /// Omit to search the current partitions in shell, runtime, api order.
    #[serde(default)]
    pub partition: Option<String>,

    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method the entry was stored under (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers, only consulted for configured vary headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// Partition the response was read from.
    pub partition: String,
    pub response: ResponseOutput,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(
    worker: &ServiceWorker, origin: &Url, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, origin).map_err(Error::from)?;
    let request = InterceptedRequest::new(&params.method, url, RequestMode::Cors).with_headers(params.headers);
    let key = worker.cache_key(&request);

    let hit = match params.partition.as_deref() {
        Some(name) => {
            let partition = resolve_partition(worker.partitions(), name).await?;
            partition
                .lookup(&key)
                .await?
                .map(|response| (partition.name().to_string(), response))
        }
        None => worker.partitions().match_any(&key).await?,
    };
    let (partition, response) =
        hit.ok_or_else(|| Error::CacheMiss(format!("{} {}", request.method(), request.url())))?;

    json_result(&CacheGetOutput { partition, response: ResponseOutput::from(&response) })
}
