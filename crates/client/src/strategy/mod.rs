//! Fetch strategies.
//!
//! Each strategy is a short state machine over one request: consult the
//! network and/or one partition, store what is worth keeping, and return
//! exactly one response. Nothing is shared between requests except the
//! partitions.

mod cache_first;
mod fallback;
mod navigation;
mod network_first;
mod stale_while_revalidate;

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use url::Url;

use swcache_core::{Error, InterceptedRequest, Partition, PartitionManager, RequestKey, Response};

pub use fallback::{offline_api_response, offline_page, offline_runtime_response};

use crate::classify::RequestClass;
use crate::fetch::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Navigation,
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    /// The strategy applied to each request category.
    pub fn for_class(class: RequestClass) -> Self {
        match class {
            RequestClass::Navigation => Strategy::Navigation,
            RequestClass::Api => Strategy::NetworkFirst,
            RequestClass::StaticAsset => Strategy::CacheFirst,
            RequestClass::SameOrigin => Strategy::StaleWhileRevalidate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Navigation => "navigation",
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

/// Where the returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Synthesized,
}

/// The single response produced for an intercepted request.
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
    pub strategy: Strategy,
    /// Background refresh started by stale-while-revalidate.
    ///
    /// Dropping the handle detaches the task; it still writes to the
    /// partition when it completes.
    pub revalidation: Option<JoinHandle<()>>,
}

impl FetchOutcome {
    fn new(response: Response, source: ResponseSource, strategy: Strategy) -> Self {
        Self { response, source, strategy, revalidation: None }
    }
}

/// Runs strategies against the partitions and the network.
#[derive(Clone)]
pub struct StrategyEngine {
    partitions: PartitionManager,
    network: Arc<dyn Network>,
    root_documents: Vec<Url>,
    vary_headers: Vec<String>,
}

impl StrategyEngine {
    /// `origin` locates the root document used as the offline navigation
    /// fallback (`/index.html`, then `/`).
    pub fn new(partitions: PartitionManager, network: Arc<dyn Network>, origin: &Url) -> Self {
        let root_documents = ["/index.html", "/"]
            .into_iter()
            .filter_map(|path| origin.join(path).ok())
            .collect();
        Self { partitions, network, root_documents, vary_headers: Vec::new() }
    }

    /// Request headers that take part in the cache key.
    pub fn with_vary_headers(mut self, headers: Vec<String>) -> Self {
        self.vary_headers = headers;
        self
    }

    pub async fn run(&self, strategy: Strategy, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        let outcome = match strategy {
            Strategy::Navigation => self.navigation(request).await?,
            Strategy::CacheFirst => self.cache_first(request).await?,
            Strategy::NetworkFirst => self.network_first(request).await?,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await?,
        };

        tracing::debug!(
            url = %request.url(),
            strategy = strategy.as_str(),
            source = ?outcome.source,
            status = outcome.response.status,
            "request handled"
        );

        Ok(outcome)
    }

    /// The key a response for `request` is stored under.
    pub fn key(&self, request: &InterceptedRequest) -> RequestKey {
        request.key(&self.vary_headers)
    }

    /// Cached root document, or the synthesized offline page.
    ///
    /// Each root is tried under the key a navigation carrying `request`'s
    /// headers would store it with, then under the plain pre-cache key.
    async fn shell_fallback(
        &self, shell: &Partition, request: &InterceptedRequest, strategy: Strategy,
    ) -> FetchOutcome {
        for root in &self.root_documents {
            let navigation = InterceptedRequest::navigate(root.clone()).with_headers(request.headers().to_vec());
            let varied = self.key(&navigation);
            let plain = RequestKey::get(root);
            let keys = if varied == plain { vec![plain] } else { vec![varied, plain] };

            for key in &keys {
                match shell.lookup(key).await {
                    Ok(Some(hit)) => return FetchOutcome::new(hit, ResponseSource::Cache, strategy),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(partition = shell.name(), url = %root, error = %e, "shell lookup failed"),
                }
            }
        }
        FetchOutcome::new(offline_page(), ResponseSource::Synthesized, strategy)
    }
}

/// Store a copy of `response`. Failures are logged and otherwise ignored;
/// the caller still gets the response.
async fn store(partition: &Partition, key: &RequestKey, response: &Response) {
    if let Err(e) = partition.put(key, response).await {
        tracing::warn!(partition = partition.name(), url = %key.url, error = %e, "failed to store response");
    }
}
