//! Named, versioned cache partitions.
//!
//! [`PartitionManager`] is the only component that creates or deletes
//! partitions. Strategies receive [`Partition`] handles and only read and
//! write entries through them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::connection::CacheDb;
use crate::Error;
use crate::http::{RequestKey, Response};

/// The three partitions a running instance uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// Pre-warmed app shell plus cache-first static assets and navigations.
    Shell,
    /// Stale-while-revalidate same-origin responses.
    Runtime,
    /// Network-first responses from the remote API.
    Api,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 3] = [PartitionKind::Shell, PartitionKind::Runtime, PartitionKind::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Shell => "shell",
            PartitionKind::Runtime => "runtime",
            PartitionKind::Api => "api",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PartitionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shell" => Ok(PartitionKind::Shell),
            "runtime" => Ok(PartitionKind::Runtime),
            "api" => Ok(PartitionKind::Api),
            other => Err(Error::InvalidInput(format!("unknown partition kind: {other}"))),
        }
    }
}

/// Current partition names, derived from a prefix and a build version token.
///
/// A new version token yields new names, which orphans the previous
/// partitions until the next activation deletes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    shell: String,
    runtime: String,
    api: String,
}

impl PartitionSet {
    pub fn new(prefix: &str, version: &str) -> Self {
        let name = |kind: PartitionKind| format!("{prefix}-{kind}-{version}");
        Self { shell: name(PartitionKind::Shell), runtime: name(PartitionKind::Runtime), api: name(PartitionKind::Api) }
    }

    pub fn name(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Shell => &self.shell,
            PartitionKind::Runtime => &self.runtime,
            PartitionKind::Api => &self.api,
        }
    }

    /// Names in lookup order: shell, runtime, api.
    pub fn names(&self) -> [&str; 3] {
        [&self.shell, &self.runtime, &self.api]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }

    /// Reverse lookup from a name to its kind.
    pub fn kind_of(&self, name: &str) -> Option<PartitionKind> {
        PartitionKind::ALL.into_iter().find(|kind| self.name(*kind) == name)
    }
}

/// Handle to one open partition.
#[derive(Debug, Clone)]
pub struct Partition {
    name: String,
    db: CacheDb,
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a copy of `response` under `key`, replacing any previous entry.
    ///
    /// The response is already buffered, so the caller keeps a fully readable
    /// response after this returns.
    pub async fn put(&self, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.db.put_entry(&self.name, key, response).await
    }

    pub async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.db.get_entry(&self.name, key).await
    }
}

/// Owner of partition creation and deletion.
#[derive(Debug, Clone)]
pub struct PartitionManager {
    db: CacheDb,
    current: PartitionSet,
}

impl PartitionManager {
    pub fn new(db: CacheDb, current: PartitionSet) -> Self {
        Self { db, current }
    }

    pub fn current(&self) -> &PartitionSet {
        &self.current
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Open one of the current partitions, creating it if absent.
    pub async fn open(&self, kind: PartitionKind) -> Result<Partition, Error> {
        self.open_named(self.current.name(kind)).await
    }

    /// Open a partition by name, creating it if absent.
    pub async fn open_named(&self, name: &str) -> Result<Partition, Error> {
        if self.db.create_partition(name).await? {
            tracing::debug!(partition = name, "created cache partition");
        }
        Ok(Partition { name: name.to_string(), db: self.db.clone() })
    }

    /// First hit for `key` across the current partitions, in shell, runtime,
    /// api order, with the name of the partition it came from. Partitions
    /// from other versions are never consulted.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<(String, Response)>, Error> {
        for name in self.current.names() {
            if let Some(response) = self.db.get_entry(name, key).await? {
                return Ok(Some((name.to_string(), response)));
            }
        }
        Ok(None)
    }

    /// Every partition currently stored, oldest first.
    pub async fn names(&self) -> Result<Vec<String>, Error> {
        self.db.partition_names().await
    }

    pub async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.db.delete_partition(name).await
    }

    /// Delete every partition whose name is not in `keep`.
    ///
    /// Returns the deleted names.
    pub async fn delete_all_except(&self, keep: &[&str]) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.names().await? {
            if keep.contains(&name.as_str()) {
                continue;
            }
            if self.db.delete_partition(&name).await? {
                tracing::info!(partition = %name, "deleted stale cache partition");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Delete the three current partitions. Calling it again is a no-op.
    ///
    /// Returns the names that existed and were removed.
    pub async fn clear_current(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.current.names() {
            if self.db.delete_partition(name).await? {
                deleted.push(name.to_string());
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    async fn manager() -> PartitionManager {
        let db = CacheDb::open_in_memory().await.unwrap();
        PartitionManager::new(db, PartitionSet::new("storefront", "v2"))
    }

    fn key(url: &str) -> RequestKey {
        RequestKey::get(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_partition_set_names() {
        let set = PartitionSet::new("storefront", "v2");
        assert_eq!(set.name(PartitionKind::Shell), "storefront-shell-v2");
        assert_eq!(set.name(PartitionKind::Runtime), "storefront-runtime-v2");
        assert_eq!(set.name(PartitionKind::Api), "storefront-api-v2");
        assert!(set.contains("storefront-api-v2"));
        assert!(!set.contains("storefront-api-v1"));
        assert_eq!(set.kind_of("storefront-runtime-v2"), Some(PartitionKind::Runtime));
    }

    #[test]
    fn test_partition_kind_parse() {
        assert_eq!("API".parse::<PartitionKind>().unwrap(), PartitionKind::Api);
        assert!("static".parse::<PartitionKind>().is_err());
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let manager = manager().await;
        let first = manager.open(PartitionKind::Shell).await.unwrap();
        first.put(&key("https://shop.test/"), &Response::new(200, "root")).await.unwrap();

        let second = manager.open(PartitionKind::Shell).await.unwrap();
        assert_eq!(second.name(), "storefront-shell-v2");
        assert!(second.lookup(&key("https://shop.test/")).await.unwrap().is_some());
        assert_eq!(manager.names().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_match_any_searches_current_partitions() {
        let manager = manager().await;
        let api = manager.open(PartitionKind::Api).await.unwrap();
        api.put(&key("https://api.test/products"), &Response::new(200, "[1]")).await.unwrap();

        let (name, response) = manager.match_any(&key("https://api.test/products")).await.unwrap().unwrap();
        assert_eq!(name, api.name());
        assert_eq!(response.text(), "[1]");
    }

    #[tokio::test]
    async fn test_match_any_ignores_old_versions() {
        let manager = manager().await;
        let old = manager.open_named("storefront-shell-v1").await.unwrap();
        old.put(&key("https://shop.test/"), &Response::new(200, "old shell")).await.unwrap();

        assert!(manager.match_any(&key("https://shop.test/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_all_except_keeps_current() {
        let manager = manager().await;
        for kind in PartitionKind::ALL {
            manager.open(kind).await.unwrap();
        }
        manager.open_named("storefront-shell-v1").await.unwrap();
        manager.open_named("storefront-api-v1").await.unwrap();

        let keep = manager.current().names();
        let deleted = manager.delete_all_except(&keep).await.unwrap();
        assert_eq!(deleted.len(), 2);

        let again = manager.delete_all_except(&keep).await.unwrap();
        assert!(again.is_empty());

        let mut remaining = manager.names().await.unwrap();
        remaining.sort();
        assert_eq!(remaining, vec!["storefront-api-v2", "storefront-runtime-v2", "storefront-shell-v2"]);
    }

    #[tokio::test]
    async fn test_clear_current_idempotent() {
        let manager = manager().await;
        for kind in PartitionKind::ALL {
            manager.open(kind).await.unwrap();
        }
        manager.open_named("unrelated").await.unwrap();

        assert_eq!(manager.clear_current().await.unwrap().len(), 3);
        assert!(manager.clear_current().await.unwrap().is_empty());
        assert_eq!(manager.names().await.unwrap(), vec!["unrelated"]);
    }

    #[tokio::test]
    async fn test_handle_outliving_partition() {
        let manager = manager().await;
        let runtime = manager.open(PartitionKind::Runtime).await.unwrap();
        manager.clear_current().await.unwrap();

        let err = runtime.put(&key("https://shop.test/a"), &Response::new(200, "a")).await.unwrap_err();
        assert!(matches!(err, Error::PartitionGone(_)));
    }
}
