//! Responses synthesized when neither the network nor a partition can answer.

use serde_json::json;

use swcache_core::Response;

const OFFLINE_PAGE: &str = "<!doctype html>\
<html lang=\"en\"><head><meta charset=\"utf-8\"><title>Offline</title></head>\
<body><h1>Offline</h1><p>Reconnect to keep shopping.</p></body></html>";

/// 503 JSON returned for API calls with no cached copy.
///
/// Pages detect `offline: true` and show an offline banner.
pub fn offline_api_response() -> Response {
    let body = json!({
        "error": "Offline",
        "message": "You are offline. Showing cached data if available.",
        "offline": true,
    });
    unavailable(body.to_string(), "application/json")
}

/// 503 JSON returned for same-origin resources on a cold cache.
pub fn offline_runtime_response() -> Response {
    let body = json!({ "error": "Offline", "offline": true });
    unavailable(body.to_string(), "application/json")
}

/// Minimal HTML page for navigations with no cached shell.
pub fn offline_page() -> Response {
    unavailable(OFFLINE_PAGE.to_string(), "text/html; charset=utf-8")
}

fn unavailable(body: String, content_type: &str) -> Response {
    Response::new(503, body)
        .with_status_text("Service Unavailable")
        .with_header("content-type", content_type)
}
