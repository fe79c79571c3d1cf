use swcache_core::{Error, InterceptedRequest, PartitionKind};

use super::{FetchOutcome, ResponseSource, Strategy, StrategyEngine, offline_api_response, store};

impl StrategyEngine {
    /// Network first. Ok responses are copied into the api partition; when
    /// the fetch fails the last copy is served, or a 503 JSON body.
    ///
    /// A non-ok status is a response, not a failure: it is returned as is
    /// and the cached copy is left alone.
    pub(super) async fn network_first(&self, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        let api = self.partitions.open(PartitionKind::Api).await?;
        let key = self.key(request);

        let error = match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    store(&api, &key, &response).await;
                }
                return Ok(FetchOutcome::new(response, ResponseSource::Network, Strategy::NetworkFirst));
            }
            Err(e) => e,
        };

        if error.is_network() {
            tracing::info!(url = %request.url(), error = %error, "api unreachable; trying cache");
        } else {
            tracing::warn!(url = %request.url(), error = %error, "api response unusable; trying cache");
        }

        match api.lookup(&key).await {
            Ok(Some(hit)) => return Ok(FetchOutcome::new(hit, ResponseSource::Cache, Strategy::NetworkFirst)),
            Ok(None) => {}
            Err(e) => tracing::warn!(partition = api.name(), url = %request.url(), error = %e, "api lookup failed"),
        }

        Ok(FetchOutcome::new(offline_api_response(), ResponseSource::Synthesized, Strategy::NetworkFirst))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;
    use swcache_core::Response;
    use url::Url;

    use super::*;
    use crate::testing::{MockNetwork, engine, ok};

    const PRODUCTS: &str = "https://fastapi-endterm.onrender.com/products?q=shoe";

    fn products() -> InterceptedRequest {
        InterceptedRequest::get(Url::parse(PRODUCTS).unwrap())
    }

    #[tokio::test]
    async fn test_ok_response_is_stored_with_identical_body() {
        let network = Arc::new(MockNetwork::new());
        network.route(PRODUCTS, ok(r#"[{"id":1,"title":"Runner"}]"#, "application/json"));
        let (engine, partitions) = engine(network).await;

        let outcome = engine.run(Strategy::NetworkFirst, &products()).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Network);

        let api = partitions.open(PartitionKind::Api).await.unwrap();
        let stored = api.lookup(&products().key(&[])).await.unwrap().unwrap();
        assert_eq!(stored.body, outcome.response.body);
        assert_eq!(stored.status, 200);
    }

    #[tokio::test]
    async fn test_network_is_always_tried_first() {
        let network = Arc::new(MockNetwork::new());
        network.route(PRODUCTS, ok("[2]", "application/json"));
        let (engine, partitions) = engine(network.clone()).await;
        let api = partitions.open(PartitionKind::Api).await.unwrap();
        api.put(&products().key(&[]), &ok("[1]", "application/json")).await.unwrap();

        let outcome = engine.run(Strategy::NetworkFirst, &products()).await.unwrap();
        assert_eq!(outcome.response.text(), "[2]");
        assert_eq!(network.calls_for(PRODUCTS), 1);
    }

    #[tokio::test]
    async fn test_offline_serves_cached_copy() {
        let network = Arc::new(MockNetwork::offline());
        let (engine, partitions) = engine(network).await;
        let api = partitions.open(PartitionKind::Api).await.unwrap();
        api.put(&products().key(&[]), &ok("[1]", "application/json")).await.unwrap();

        let outcome = engine.run(Strategy::NetworkFirst, &products()).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.text(), "[1]");
    }

    #[tokio::test]
    async fn test_offline_without_copy_returns_503_json() {
        let (engine, _) = engine(Arc::new(MockNetwork::offline())).await;

        let outcome = engine.run(Strategy::NetworkFirst, &products()).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Synthesized);
        assert_eq!(outcome.response.status, 503);
        assert_eq!(outcome.response.content_type(), Some("application/json"));

        let body: Value = serde_json::from_slice(&outcome.response.body).unwrap();
        assert_eq!(body["error"], "Offline");
        assert_eq!(body["offline"], true);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_server_error_is_returned_not_replaced() {
        let network = Arc::new(MockNetwork::new());
        network.route(PRODUCTS, Response::new(500, "boom"));
        let (engine, partitions) = engine(network).await;
        let api = partitions.open(PartitionKind::Api).await.unwrap();
        api.put(&products().key(&[]), &ok("[1]", "application/json")).await.unwrap();

        let outcome = engine.run(Strategy::NetworkFirst, &products()).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.status, 500);

        let stored = api.lookup(&products().key(&[])).await.unwrap().unwrap();
        assert_eq!(stored.text(), "[1]");
    }

    #[tokio::test]
    async fn test_cached_copy_from_other_partition_is_not_used() {
        let (engine, partitions) = engine(Arc::new(MockNetwork::offline())).await;
        let runtime = partitions.open(PartitionKind::Runtime).await.unwrap();
        runtime.put(&products().key(&[]), &ok("[9]", "application/json")).await.unwrap();

        let outcome = engine.run(Strategy::NetworkFirst, &products()).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Synthesized);
    }
}
