//! Fixtures shared by the tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use serde_json::Value;
use swcache_client::{Network, ServiceWorker};
use swcache_core::{AppConfig, CacheDb, Error, InterceptedRequest, Response};

pub const ORIGIN: &str = "https://shop.test";

/// Serves routed URLs, 404 for the rest, or fails everything when offline.
#[derive(Default)]
pub struct StaticNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: Mutex<bool>,
}

impl StaticNetwork {
    pub fn route(&self, url: &str, body: &str, content_type: &str) {
        let response = Response::new(200, body.to_string())
            .with_status_text("OK")
            .with_header("content-type", content_type)
            .with_url(url);
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }
}

#[async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, Error> {
        if *self.offline.lock().unwrap() {
            return Err(Error::Network(format!("offline: {}", request.url())));
        }
        let routed = self.routes.lock().unwrap().get(request.url().as_str()).cloned();
        Ok(routed.unwrap_or_else(|| Response::new(404, "").with_status_text("Not Found")))
    }
}

pub fn config() -> AppConfig {
    AppConfig {
        origin: ORIGIN.into(),
        shell_manifest: vec!["/".into(), "/index.html".into()],
        ..Default::default()
    }
}

/// A worker over an in-memory database with the root documents routed.
pub async fn worker() -> (Arc<ServiceWorker>, Arc<StaticNetwork>) {
    let network = Arc::new(StaticNetwork::default());
    network.route("https://shop.test/", "<root>", "text/html");
    network.route("https://shop.test/index.html", "<index>", "text/html");

    let db = CacheDb::open_in_memory().await.unwrap();
    let worker = ServiceWorker::new(&config(), db, network.clone()).unwrap();
    (Arc::new(worker), network)
}

/// Parse the JSON text content of a tool result.
pub fn output(result: &CallToolResult) -> Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
