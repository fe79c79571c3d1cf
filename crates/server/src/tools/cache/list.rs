//! cache_list tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{PartitionManager, cache::EntrySummary};

use super::resolve_partition;
use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Partition kind (`shell`, `runtime`, `api`) or full partition name.
    pub partition: String,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub partition: String,
    /// Stored entries, newest first. Bodies are not included.
    pub entries: Vec<EntrySummary>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(partitions: &PartitionManager, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let partition = resolve_partition(partitions, &params.partition).await?;
    let entries = partitions.db().list_entries(partition.name()).await?;

    json_result(&CacheListOutput { partition: partition.name().to_string(), entries })
}
