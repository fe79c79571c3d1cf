//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and trimming partitions.

pub mod get;
pub mod list;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use list::{CacheListParams, list_impl};
pub use purge::{CachePurgeParams, purge_impl};

use swcache_core::{Error, Partition, PartitionKind, PartitionManager};

/// Open a partition by kind (`shell`, `runtime`, `api`) or by full name.
///
/// Full names must already exist; kinds resolve to the current version.
pub(crate) async fn resolve_partition(partitions: &PartitionManager, name: &str) -> Result<Partition, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("partition cannot be empty".into()));
    }

    if let Ok(kind) = name.parse::<PartitionKind>() {
        return partitions.open(kind).await;
    }

    if !partitions.db().partition_exists(name).await? {
        return Err(Error::CacheMiss(format!("no partition named {name}")));
    }
    partitions.open_named(name).await
}
