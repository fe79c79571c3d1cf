use swcache_core::{Error, InterceptedRequest, PartitionKind};

use super::{FetchOutcome, ResponseSource, Strategy, StrategyEngine, store};

impl StrategyEngine {
    /// Network, storing ok documents in the shell partition. A failed fetch
    /// or a non-ok status serves the cached root document instead.
    pub(super) async fn navigation(&self, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        let shell = self.partitions.open(PartitionKind::Shell).await?;

        match self.network.fetch(request).await {
            Ok(response) if response.is_ok() => {
                store(&shell, &self.key(request), &response).await;
                return Ok(FetchOutcome::new(response, ResponseSource::Network, Strategy::Navigation));
            }
            Ok(response) => {
                tracing::info!(url = %request.url(), status = response.status, "navigation not ok; using shell");
            }
            Err(e) => {
                tracing::info!(url = %request.url(), error = %e, "navigation failed; serving cached shell");
            }
        }

        Ok(self.shell_fallback(&shell, request, Strategy::Navigation).await)
    }
}
