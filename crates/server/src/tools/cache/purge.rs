//! cache_purge tool implementation.
//!
//! Purges entries of one partition by host or count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{Error, PartitionManager};

use super::resolve_partition;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Partition kind (`shell`, `runtime`, `api`) or full partition name.
    pub partition: String,

    /// Purge entries whose URL host matches this host.
    pub host: Option<String>,

    /// Keep only the newest N entries (LRU purge).
    pub max_entries: Option<usize>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub partition: String,
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(partitions: &PartitionManager, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.host.is_none() && params.max_entries.is_none() {
        return Err(Error::InvalidInput("At least one of host or max_entries must be specified".to_string()).into());
    }

    let partition = resolve_partition(partitions, &params.partition).await?;
    let db = partitions.db();
    let mut deleted_total = 0u64;

    if let Some(host) = params.host {
        deleted_total += db.purge_entries_by_host(partition.name(), &host).await?;
    }

    if let Some(max_entries) = params.max_entries {
        deleted_total += db.purge_lru_entries(partition.name(), max_entries).await?;
    }

    tracing::info!(partition = partition.name(), deleted = deleted_total, "purged cache entries");

    let output = CachePurgeOutput { partition: partition.name().to_string(), deleted: deleted_total };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use swcache_core::{PartitionKind, RequestKey, Response};
    use url::Url;

    use super::*;
    use crate::tools::testing::{output, worker};

    async fn seed(partitions: &PartitionManager, urls: &[&str]) {
        let runtime = partitions.open(PartitionKind::Runtime).await.unwrap();
        for url in urls {
            let key = RequestKey::get(&Url::parse(url).unwrap());
            runtime.put(&key, &Response::new(200, "x")).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_purge_by_host() {
        let (worker, _) = worker().await;
        seed(worker.partitions(), &["https://shop.test/a.json", "https://cdn.test/b.json"]).await;

        let params = CachePurgeParams { partition: "runtime".into(), host: Some("cdn.test".into()), max_entries: None };
        let result = purge_impl(worker.partitions(), params).await.unwrap();
        let out = output(&result);
        assert_eq!(out["deleted"], 1);
        assert_eq!(out["partition"], "storefront-runtime-v2");
    }

    #[tokio::test]
    async fn test_purge_lru() {
        let (worker, _) = worker().await;
        seed(worker.partitions(), &["https://shop.test/a.json", "https://shop.test/b.json"]).await;

        let params = CachePurgeParams { partition: "runtime".into(), host: None, max_entries: Some(1) };
        let result = purge_impl(worker.partitions(), params).await.unwrap();
        assert_eq!(output(&result)["deleted"], 1);
        assert_eq!(worker.partitions().db().count_entries("storefront-runtime-v2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_no_params() {
        let (worker, _) = worker().await;
        let params = CachePurgeParams { partition: "runtime".into(), host: None, max_entries: None };

        let result = purge_impl(worker.partitions(), params).await;
        assert!(result.is_err());
    }
}
