//! Request classification.
//!
//! Exclusions are checked before any category, so a request to an excluded
//! host never reaches a strategy even when its path looks like a static asset.
//! Among the categories the order is navigation, API, static asset, then
//! same-origin.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use swcache_core::{AppConfig, Error, InterceptedRequest};

static STATIC_ASSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(js|css|png|jpg|jpeg|gif|svg|ico|woff|woff2|ttf|eot)$").expect("static asset pattern is valid")
});

/// Category of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    Navigation,
    Api,
    StaticAsset,
    SameOrigin,
}

/// Why a request was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassReason {
    /// Only GET requests are intercepted.
    UnsafeMethod,
    /// The intermediary's own control script.
    WorkerScript,
    /// Third-party auth or telemetry host.
    ExcludedHost,
    /// Cross-origin and not the API.
    Foreign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Intercept(RequestClass),
    Passthrough(PassReason),
}

/// Maps a request to a category or an exclusion.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    api_base: Url,
    api_substring_match: bool,
    worker_script_path: String,
    excluded_hosts: Vec<String>,
}

impl Classifier {
    pub fn new(origin: Url, api_base: Url) -> Self {
        Self {
            origin,
            api_base,
            api_substring_match: false,
            worker_script_path: "/service-worker.js".into(),
            excluded_hosts: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(config.origin_url()?, config.api_base()?)
            .with_substring_match(config.api_substring_match)
            .with_worker_script(&config.worker_script_path)
            .with_excluded_hosts(config.excluded_hosts.iter().cloned()))
    }

    pub fn with_substring_match(mut self, enabled: bool) -> Self {
        self.api_substring_match = enabled;
        self
    }

    pub fn with_worker_script(mut self, path: &str) -> Self {
        self.worker_script_path = path.to_string();
        self
    }

    pub fn with_excluded_hosts(mut self, hosts: impl IntoIterator<Item = String>) -> Self {
        self.excluded_hosts = hosts.into_iter().map(|h| h.to_ascii_lowercase()).collect();
        self
    }

    pub fn classify(&self, request: &InterceptedRequest) -> Classification {
        let url = request.url();

        if request.method() != "GET" {
            return Classification::Passthrough(PassReason::UnsafeMethod);
        }
        if url.path().contains(&self.worker_script_path) {
            return Classification::Passthrough(PassReason::WorkerScript);
        }
        if self.is_excluded_host(url) {
            return Classification::Passthrough(PassReason::ExcludedHost);
        }

        if request.is_navigation() {
            return Classification::Intercept(RequestClass::Navigation);
        }
        if self.is_api(url) {
            return Classification::Intercept(RequestClass::Api);
        }
        if url.origin() != self.origin.origin() {
            return Classification::Passthrough(PassReason::Foreign);
        }
        if STATIC_ASSET.is_match(url.path()) {
            return Classification::Intercept(RequestClass::StaticAsset);
        }

        Classification::Intercept(RequestClass::SameOrigin)
    }

    fn is_excluded_host(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.excluded_hosts.iter().any(|marker| host.contains(marker.as_str()))
    }

    fn is_api(&self, url: &Url) -> bool {
        if url.origin() == self.api_base.origin() && url.path().starts_with(self.api_base.path()) {
            return true;
        }
        self.api_substring_match && url.as_str().contains(self.api_base.as_str().trim_end_matches('/'))
    }
}
