//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::PartitionSet;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*, `__` separates nested keys)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite partition store.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the application the intermediary serves.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Base URL of the remote product/cart/favorites API.
    ///
    /// Set via SWCACHE_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Also treat any URL containing the API base as an API call.
    ///
    /// Off by default: the substring test misfires on URLs that merely embed
    /// the API address (e.g. in a query parameter).
    #[serde(default)]
    pub api_substring_match: bool,

    /// Prefix shared by all partition names.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Build version token embedded in partition names.
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// App shell paths pre-cached on install.
    #[serde(default = "default_shell_manifest")]
    pub shell_manifest: Vec<String>,

    /// Path of the intermediary's own control script; never intercepted.
    #[serde(default = "default_worker_script_path")]
    pub worker_script_path: String,

    /// Host substrings of third-party auth/telemetry services; never intercepted.
    #[serde(default = "default_excluded_hosts")]
    pub excluded_hosts: Vec<String>,

    /// Request headers that take part in the cache key.
    #[serde(default)]
    pub vary_headers: Vec<String>,

    /// Promote a freshly installed version without waiting for pages to close.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// User-Agent string for network requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes buffered per response.
    ///
    /// Set via SWCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional request timeout in milliseconds. Unset means the transport
    /// decides when a hung connection has failed.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Maximum number of redirects followed per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Fallback values for push notifications.
    #[serde(default)]
    pub notification: NotificationDefaults,
}

/// Defaults merged under every incoming push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDefaults {
    #[serde(default = "default_notification_title")]
    pub title: String,
    #[serde(default = "default_notification_body")]
    pub body: String,
    #[serde(default = "default_notification_icon")]
    pub icon: String,
    #[serde(default = "default_notification_icon")]
    pub badge: String,
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            body: default_notification_body(),
            icon: default_notification_icon(),
            badge: default_notification_icon(),
            vibrate: default_vibrate(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_api_base_url() -> String {
    "https://fastapi-endterm.onrender.com".into()
}

fn default_cache_prefix() -> String {
    "storefront".into()
}

fn default_cache_version() -> String {
    "v2".into()
}

fn default_shell_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/manifest.json",
        "/static/js/bundle.js",
        "/static/css/main.css",
        "/logo192.png",
        "/logo512.png",
        "/favicon.ico",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_worker_script_path() -> String {
    "/service-worker.js".into()
}

fn default_excluded_hosts() -> Vec<String> {
    vec!["firebase".into(), "googleapis".into()]
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_notification_title() -> String {
    "New Update".into()
}

fn default_notification_body() -> String {
    "You have a new notification".into()
}

fn default_notification_icon() -> String {
    "/logo192.png".into()
}

fn default_vibrate() -> Vec<u32> {
    vec![200, 100, 200]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            api_base_url: default_api_base_url(),
            api_substring_match: false,
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            shell_manifest: default_shell_manifest(),
            worker_script_path: default_worker_script_path(),
            excluded_hosts: default_excluded_hosts(),
            vary_headers: Vec::new(),
            skip_waiting_on_install: true,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
            max_redirects: default_max_redirects(),
            notification: NotificationDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The application origin as a parsed URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        parse_http_url("origin", &self.origin)
    }

    /// The remote API base as a parsed URL.
    pub fn api_base(&self) -> Result<Url, ConfigError> {
        parse_http_url("api_base_url", &self.api_base_url)
    }

    /// Partition names for this build.
    pub fn partition_set(&self) -> PartitionSet {
        PartitionSet::new(&self.cache_prefix, &self.cache_version)
    }

    /// Absolute URLs of the app shell manifest.
    pub fn shell_urls(&self) -> Result<Vec<Url>, ConfigError> {
        let origin = self.origin_url()?;
        self.shell_manifest
            .iter()
            .map(|path| {
                origin.join(path).map_err(|e| ConfigError::Invalid {
                    field: "shell_manifest".into(),
                    reason: format!("{path}: {e}"),
                })
            })
            .collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::Invalid { field: field.into(), reason: format!("unsupported scheme: {scheme}") }),
    }
}
