use std::sync::Arc;

use swcache_core::{Error, InterceptedRequest, Partition, PartitionKind, RequestKey};

use super::{FetchOutcome, ResponseSource, Strategy, StrategyEngine, offline_runtime_response, store};
use crate::fetch::Network;

impl StrategyEngine {
    /// Cached copy immediately, refreshed in the background. On a cold cache
    /// the caller waits for the network.
    pub(super) async fn stale_while_revalidate(&self, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        let runtime = self.partitions.open(PartitionKind::Runtime).await?;
        let key = self.key(request);

        let cached = match runtime.lookup(&key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(partition = runtime.name(), url = %request.url(), error = %e, "runtime lookup failed");
                None
            }
        };

        if let Some(hit) = cached {
            let handle = tokio::spawn(revalidate(self.network.clone(), runtime, request.clone(), key));
            let mut outcome = FetchOutcome::new(hit, ResponseSource::Cache, Strategy::StaleWhileRevalidate);
            outcome.revalidation = Some(handle);
            return Ok(outcome);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    store(&runtime, &key, &response).await;
                }
                Ok(FetchOutcome::new(response, ResponseSource::Network, Strategy::StaleWhileRevalidate))
            }
            Err(e) => {
                tracing::info!(url = %request.url(), error = %e, "fetch failed on cold cache");
                let offline = offline_runtime_response();
                Ok(FetchOutcome::new(offline, ResponseSource::Synthesized, Strategy::StaleWhileRevalidate))
            }
        }
    }
}

/// Background refresh. Owns everything it touches so it can outlive the
/// request that started it; failures end here.
async fn revalidate(network: Arc<dyn Network>, runtime: Partition, request: InterceptedRequest, key: RequestKey) {
    match network.fetch(&request).await {
        Ok(response) if response.is_ok() => {
            store(&runtime, &key, &response).await;
            tracing::debug!(partition = runtime.name(), url = %request.url(), "revalidated");
        }
        Ok(response) => {
            tracing::debug!(url = %request.url(), status = response.status, "revalidation not ok; keeping cached copy");
        }
        Err(e) => {
            tracing::debug!(url = %request.url(), error = %e, "revalidation failed; keeping cached copy");
        }
    }
}
