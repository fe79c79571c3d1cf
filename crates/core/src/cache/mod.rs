//! SQLite-backed partition storage.
//!
//! Persistent key-to-response stores grouped into named partitions, using
//! SQLite with async access via tokio-rusqlite. It provides:
//!
//! - Content-addressed entry keys (SHA-256 over method, URL and vary headers)
//! - Versioned partition names with prune-on-activate
//! - Automatic schema migrations
//! - WAL mode so background refreshes and foreground reads interleave
//! - Maintenance purges (by host, LRU)

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::EntrySummary;
pub use partitions::{Partition, PartitionKind, PartitionManager, PartitionSet};
