use swcache_core::{Error, InterceptedRequest, PartitionKind};

use super::{FetchOutcome, ResponseSource, Strategy, StrategyEngine, store};

impl StrategyEngine {
    /// Shell partition first; the network is only touched on a miss.
    pub(super) async fn cache_first(&self, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        let shell = self.partitions.open(PartitionKind::Shell).await?;
        let key = self.key(request);

        match shell.lookup(&key).await {
            Ok(Some(hit)) => return Ok(FetchOutcome::new(hit, ResponseSource::Cache, Strategy::CacheFirst)),
            Ok(None) => {}
            Err(e) => tracing::warn!(partition = shell.name(), url = %request.url(), error = %e, "shell lookup failed"),
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    store(&shell, &key, &response).await;
                }
                Ok(FetchOutcome::new(response, ResponseSource::Network, Strategy::CacheFirst))
            }
            Err(e) if request.is_navigation() => {
                tracing::info!(url = %request.url(), error = %e, "document fetch failed; serving cached shell");
                Ok(self.shell_fallback(&shell, request, Strategy::CacheFirst).await)
            }
            Err(e) => {
                tracing::warn!(url = %request.url(), error = %e, "asset fetch failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use swcache_core::{RequestKey, Response};
    use url::Url;

    use super::*;
    use crate::testing::{MockNetwork, engine, ok};

    fn get(url: &str) -> InterceptedRequest {
        InterceptedRequest::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_miss_then_hit_without_network() {
        let network = Arc::new(MockNetwork::new());
        network.route("https://shop.test/app.js", ok("console.log(1)", "application/javascript"));
        let (engine, partitions) = engine(network.clone()).await;

        let first = engine.run(Strategy::CacheFirst, &get("https://shop.test/app.js")).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(network.calls(), 1);

        let shell = partitions.open(PartitionKind::Shell).await.unwrap();
        let stored = shell.lookup(&RequestKey::get(get("https://shop.test/app.js").url())).await.unwrap();
        assert_eq!(stored.unwrap().body, first.response.body);

        let second = engine.run(Strategy::CacheFirst, &get("https://shop.test/app.js")).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.text(), "console.log(1)");
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_hit_never_touches_network() {
        let network = Arc::new(MockNetwork::offline());
        let (engine, partitions) = engine(network.clone()).await;
        let shell = partitions.open(PartitionKind::Shell).await.unwrap();

        for path in ["/logo192.png", "/static/css/main.css", "/favicon.ico"] {
            let request = get(&format!("https://shop.test{path}"));
            shell.put(&request.key(&[]), &ok(path, "application/octet-stream")).await.unwrap();

            let outcome = engine.run(Strategy::CacheFirst, &request).await.unwrap();
            assert_eq!(outcome.source, ResponseSource::Cache);
            assert_eq!(outcome.response.text(), path);
        }
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_ok_is_returned_but_not_stored() {
        let network = Arc::new(MockNetwork::new());
        let (engine, partitions) = engine(network.clone()).await;

        let outcome = engine.run(Strategy::CacheFirst, &get("https://shop.test/missing.png")).await.unwrap();
        assert_eq!(outcome.response.status, 404);

        let shell = partitions.open(PartitionKind::Shell).await.unwrap();
        assert_eq!(partitions.db().count_entries(shell.name()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_asset_failure_propagates() {
        let (engine, _) = engine(Arc::new(MockNetwork::offline())).await;

        let result = engine.run(Strategy::CacheFirst, &get("https://shop.test/logo512.png")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_document_failure_falls_back_to_root() {
        let (engine, partitions) = engine(Arc::new(MockNetwork::offline())).await;
        let shell = partitions.open(PartitionKind::Shell).await.unwrap();
        let root = Response::new(200, "<root>").with_header("content-type", "text/html");
        shell.put(&RequestKey::get(&Url::parse("https://shop.test/").unwrap()), &root).await.unwrap();

        let request = InterceptedRequest::navigate(Url::parse("https://shop.test/cart").unwrap());
        let outcome = engine.run(Strategy::CacheFirst, &request).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.text(), "<root>");
    }
}
