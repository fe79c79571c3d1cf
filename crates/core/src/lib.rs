//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Partition storage with SQLite backend
//! - The request/response model the strategies operate on
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, Partition, PartitionKind, PartitionManager, PartitionSet};
pub use config::{AppConfig, ConfigError, NotificationDefaults};
pub use error::Error;
pub use http::{InterceptedRequest, RequestKey, RequestMode, Response};
