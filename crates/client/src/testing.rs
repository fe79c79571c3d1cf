//! In-process network double for strategy and lifecycle tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use swcache_core::{CacheDb, Error, InterceptedRequest, PartitionManager, PartitionSet, Response};

use crate::fetch::Network;
use crate::strategy::StrategyEngine;

/// Scripted [`Network`]: routes by exact URL, 404 otherwise.
#[derive(Default)]
pub(crate) struct MockNetwork {
    routes: Mutex<HashMap<String, Response>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl MockNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn offline() -> Self {
        let network = Self::default();
        network.set_offline(true);
        network
    }

    /// Hold every fetch until the gate is notified.
    pub(crate) fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Self::default() }
    }

    pub(crate) fn route(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait::async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, Error> {
        let url = request.url().to_string();
        self.calls.lock().unwrap().push(url.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{url}: connection refused")));
        }

        let routed = self.routes.lock().unwrap().get(&url).cloned();
        Ok(routed.unwrap_or_else(|| Response::new(404, "not found").with_status_text("Not Found").with_url(url)))
    }
}

pub(crate) fn ok(body: &str, content_type: &str) -> Response {
    Response::new(200, body.to_string()).with_status_text("OK").with_header("content-type", content_type)
}

pub(crate) async fn partitions() -> PartitionManager {
    let db = CacheDb::open_in_memory().await.unwrap();
    PartitionManager::new(db, PartitionSet::new("storefront", "v2"))
}

pub(crate) const ORIGIN: &str = "https://shop.test";

pub(crate) async fn engine(network: Arc<MockNetwork>) -> (StrategyEngine, PartitionManager) {
    let partitions = partitions().await;
    let origin = url::Url::parse(ORIGIN).unwrap();
    (StrategyEngine::new(partitions.clone(), network, &origin), partitions)
}
