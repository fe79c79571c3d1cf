//! Request and response model shared by the strategies and the storage layer.
//!
//! Bodies are always fully buffered. Cloning a [`Response`] hands out a second,
//! independently readable view of the same bytes, which is what lets a strategy
//! store a copy and still return the original to the caller.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// Fetch mode reported by the host for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Full document load.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// An outgoing request observed before it reaches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    method: String,
    url: Url,
    mode: RequestMode,
    headers: Vec<(String, String)>,
}

impl InterceptedRequest {
    /// Build a request. The method is upper-cased and the URL fragment dropped.
    pub fn new(method: &str, mut url: Url, mode: RequestMode) -> Self {
        url.set_fragment(None);
        Self { method: method.trim().to_ascii_uppercase(), url, mode, headers: Vec::new() }
    }

    /// Shorthand for a `GET` in `cors` mode.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Cors)
    }

    /// Shorthand for a document load.
    pub fn navigate(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Navigate)
    }

    /// Attach request headers; names are stored lower-case.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The lookup key for this request, varying on the named headers.
    ///
    /// Only headers the request carries take part, so a request without any
    /// of them keys the same as [`RequestKey::get`] under every vary list.
    pub fn key(&self, vary_headers: &[String]) -> RequestKey {
        let vary = vary_headers
            .iter()
            .filter_map(|name| {
                self.header(name)
                    .map(|value| format!("{}={}", name.to_ascii_lowercase(), value))
            })
            .collect::<Vec<_>>()
            .join("&");
        RequestKey { method: self.method.clone(), url: self.url.to_string(), vary }
    }
}

/// The identity under which a response is stored inside a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
    pub vary: String,
}

impl RequestKey {
    /// Key for a plain `GET` of `url` with no varying headers.
    pub fn get(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: "GET".into(), url: url.to_string(), vary: String::new() }
    }
}

/// A buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// URL the response was produced for, if it came from the network.
    pub url: Option<String>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: String::new(), headers: Vec::new(), body: body.into(), url: None }
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_request_normalizes_method_and_fragment() {
        let req = InterceptedRequest::new("get", url("https://shop.test/cart#top"), RequestMode::SameOrigin);
        assert_eq!(req.method(), "GET");
        assert_eq!(req.url().as_str(), "https://shop.test/cart");
        assert!(!req.is_navigation());
    }

    #[test]
    fn test_request_key_ignores_headers_by_default() {
        let a = InterceptedRequest::get(url("https://shop.test/a.js")).with_headers([("Accept", "text/css")]);
        let b = InterceptedRequest::get(url("https://shop.test/a.js"));
        assert_eq!(a.key(&[]), b.key(&[]));
    }

    #[test]
    fn test_request_key_varies_on_named_headers() {
        let vary = vec!["Accept-Language".to_string()];
        let en = InterceptedRequest::get(url("https://shop.test/")).with_headers([("accept-language", "en")]);
        let kk = InterceptedRequest::get(url("https://shop.test/")).with_headers([("Accept-Language", "kk")]);
        assert_ne!(en.key(&vary), kk.key(&vary));
        assert_eq!(en.key(&vary).vary, "accept-language=en");
    }

    #[test]
    fn test_absent_vary_headers_leave_key_plain() {
        let vary = vec!["accept-language".to_string(), "x-currency".to_string()];
        let bare = InterceptedRequest::get(url("https://shop.test/static/js/bundle.js"));
        assert_eq!(bare.key(&vary), RequestKey::get(&url("https://shop.test/static/js/bundle.js")));

        let partial = InterceptedRequest::get(url("https://shop.test/")).with_headers([("X-Currency", "KZT")]);
        assert_eq!(partial.key(&vary).vary, "x-currency=KZT");
    }

    #[test]
    fn test_get_key_matches_request_key() {
        let req = InterceptedRequest::navigate(url("https://shop.test/index.html"));
        assert_eq!(req.key(&[]), RequestKey::get(&url("https://shop.test/index.html")));
    }

    #[test]
    fn test_response_clone_is_independently_readable() {
        let original = Response::new(200, "payload").with_header("Content-Type", "text/plain");
        let copy = original.clone();
        drop(original);
        assert_eq!(copy.text(), "payload");
        assert_eq!(copy.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_response_is_ok_range() {
        assert!(Response::new(200, "").is_ok());
        assert!(Response::new(204, "").is_ok());
        assert!(!Response::new(304, "").is_ok());
        assert!(!Response::new(503, "").is_ok());
    }

    #[test]
    fn test_request_mode_serde() {
        let mode: RequestMode = serde_json::from_str("\"navigate\"").unwrap();
        assert_eq!(mode, RequestMode::Navigate);
        let mode: RequestMode = serde_json::from_str("\"same-origin\"").unwrap();
        assert_eq!(mode, RequestMode::SameOrigin);
    }
}
