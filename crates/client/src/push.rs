//! Push delivery: building notifications from payloads and routing clicks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use swcache_core::{Error, NotificationDefaults};

use crate::host::{Clients, Notifier, WindowClient};

/// A notification as handed to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub require_interaction: bool,
    #[serde(default)]
    pub vibrate: Vec<u32>,
}

impl Notification {
    /// The `data.type` discriminator set by the sender.
    pub fn kind(&self) -> NotificationKind {
        match self.data.as_ref().and_then(|d| d.get("type")).and_then(Value::as_str) {
            Some("cart-add") => NotificationKind::CartAdd,
            Some("checkout") => NotificationKind::Checkout,
            _ => NotificationKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    CartAdd,
    Checkout,
    Other,
}

/// What a click ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum ClickAction {
    /// Focused the window with this id.
    Focused(String),
    /// Opened a new window at this URL.
    Opened(String),
    /// The host refused; nothing happened.
    None,
}

/// Builds notifications from push payloads and routes notification clicks.
#[derive(Debug, Clone)]
pub struct PushDispatcher {
    defaults: NotificationDefaults,
    origin: Url,
}

impl PushDispatcher {
    pub fn new(defaults: NotificationDefaults, origin: Url) -> Self {
        Self { defaults, origin }
    }

    /// Merge a payload over the defaults.
    ///
    /// Missing and empty fields take the default. A payload that is not JSON
    /// becomes the body; a JSON payload that is not an object is ignored.
    pub fn build_notification(&self, payload: Option<&[u8]>) -> Notification {
        let defaults = &self.defaults;
        let mut notification = Notification {
            title: defaults.title.clone(),
            body: defaults.body.clone(),
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            tag: None,
            data: None,
            require_interaction: false,
            vibrate: defaults.vibrate.clone(),
        };

        let Some(payload) = payload else {
            return notification;
        };

        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(fields)) => {
                let text = |name: &str| {
                    fields
                        .get(name)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };
                if let Some(title) = text("title") {
                    notification.title = title;
                }
                if let Some(body) = text("body") {
                    notification.body = body;
                }
                if let Some(icon) = text("icon") {
                    notification.icon = icon;
                }
                if let Some(badge) = text("badge") {
                    notification.badge = badge;
                }
                notification.tag = text("tag");
                notification.data = fields.get("data").filter(|v| !v.is_null()).cloned();
                notification.require_interaction =
                    fields.get("requireInteraction").and_then(Value::as_bool).unwrap_or(false);
            }
            Ok(other) => {
                tracing::debug!(payload = %other, "push payload is not an object; using defaults");
            }
            Err(_) => {
                let text = String::from_utf8_lossy(payload);
                if !text.is_empty() {
                    notification.body = text.into_owned();
                }
            }
        }

        notification
    }

    /// Build and display the notification for a push.
    pub async fn receive(&self, payload: Option<&[u8]>, notifier: &dyn Notifier) -> Result<Notification, Error> {
        let notification = self.build_notification(payload);
        notifier.show(&notification).await?;
        tracing::info!(title = %notification.title, tag = ?notification.tag, "notification shown");
        Ok(notification)
    }

    /// Close the notification, then focus or open the window it points at.
    ///
    /// Host failures are logged and swallowed.
    pub async fn click(
        &self, notification: &Notification, clients: &dyn Clients, notifier: &dyn Notifier,
    ) -> ClickAction {
        if let Err(e) = notifier.close(notification).await {
            tracing::debug!(error = %e, "failed to close notification");
        }

        let windows = match clients.match_all().await {
            Ok(windows) => windows,
            Err(e) => {
                tracing::debug!(error = %e, "failed to list windows");
                return ClickAction::None;
            }
        };

        let kind = notification.kind();
        let target = match kind {
            NotificationKind::CartAdd => windows.iter().find(|w| is_root(w) || w.url.contains("/cart")),
            NotificationKind::Checkout => windows.iter().find(|w| w.url.contains("/cart")),
            NotificationKind::Other => windows.first(),
        };

        if let Some(window) = target {
            return match clients.focus(&window.id).await {
                Ok(()) => ClickAction::Focused(window.id.clone()),
                Err(e) => {
                    tracing::debug!(window = %window.id, error = %e, "failed to focus window");
                    ClickAction::None
                }
            };
        }

        let path = match kind {
            NotificationKind::CartAdd | NotificationKind::Checkout => "/cart",
            NotificationKind::Other => "/",
        };
        let url = match self.origin.join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(path, error = %e, "failed to resolve window target");
                return ClickAction::None;
            }
        };

        match clients.open_window(&url).await {
            Ok(()) => ClickAction::Opened(url.to_string()),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "failed to open window");
                ClickAction::None
            }
        }
    }
}

fn is_root(window: &WindowClient) -> bool {
    match Url::parse(&window.url) {
        Ok(url) => url.path() == "/",
        Err(_) => window.url == "/",
    }
}
