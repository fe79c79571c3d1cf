//! Interfaces to the runtime hosting the intermediary.
//!
//! The intermediary never reaches for ambient host state; windows and the
//! notification surface are handed to each event handler that needs them.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use url::Url;

use swcache_core::Error;

use crate::push::Notification;

/// An open application window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub focused: bool,
}

/// Open application windows.
#[async_trait::async_trait]
pub trait Clients: Send + Sync {
    /// Every window of the application, controlled or not.
    async fn match_all(&self) -> Result<Vec<WindowClient>, Error>;

    async fn focus(&self, id: &str) -> Result<(), Error>;

    async fn open_window(&self, url: &Url) -> Result<(), Error>;

    /// Take control of every open page.
    async fn claim(&self) -> Result<(), Error>;
}

/// Platform notification surface.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: &Notification) -> Result<(), Error>;

    async fn close(&self, notification: &Notification) -> Result<(), Error>;
}

/// Something the intermediary asked the host to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    Focus { id: String },
    OpenWindow { url: String },
    Claim,
    Show { notification: Notification },
    Close { tag: Option<String> },
}

/// [`Clients`] adapter for hosts that deliver their window list with each
/// event and apply the requested actions themselves.
///
/// Serves the given windows and records every focus, open and claim as a
/// [`HostAction`] for the host to replay.
#[derive(Debug, Default)]
pub struct RecordingClients {
    windows: Vec<WindowClient>,
    actions: Mutex<Vec<HostAction>>,
}

impl RecordingClients {
    pub fn new(windows: Vec<WindowClient>) -> Self {
        Self { windows, actions: Mutex::new(Vec::new()) }
    }

    pub fn actions(&self) -> Vec<HostAction> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn record(&self, action: HostAction) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
    }
}

#[async_trait::async_trait]
impl Clients for RecordingClients {
    async fn match_all(&self) -> Result<Vec<WindowClient>, Error> {
        Ok(self.windows.clone())
    }

    async fn focus(&self, id: &str) -> Result<(), Error> {
        if !self.windows.iter().any(|w| w.id == id) {
            return Err(Error::Host(format!("no window with id {id}")));
        }
        self.record(HostAction::Focus { id: id.to_string() });
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        self.record(HostAction::OpenWindow { url: url.to_string() });
        Ok(())
    }

    async fn claim(&self) -> Result<(), Error> {
        self.record(HostAction::Claim);
        Ok(())
    }
}

/// [`Notifier`] adapter that records show and close requests as
/// [`HostAction`]s for the host to replay.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    actions: Mutex<Vec<HostAction>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<HostAction> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Notifications shown so far.
    pub fn shown(&self) -> Vec<Notification> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                HostAction::Show { notification } => Some(notification),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: HostAction) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), Error> {
        self.record(HostAction::Show { notification: notification.clone() });
        Ok(())
    }

    async fn close(&self, notification: &Notification) -> Result<(), Error> {
        self.record(HostAction::Close { tag: notification.tag.clone() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: &str, url: &str) -> WindowClient {
        WindowClient { id: id.into(), url: url.into(), focused: false }
    }

    #[tokio::test]
    async fn test_recording_clients_records_in_order() {
        let clients = RecordingClients::new(vec![window("w1", "https://shop.test/")]);
        clients.claim().await.unwrap();
        clients.focus("w1").await.unwrap();
        clients.open_window(&Url::parse("https://shop.test/cart").unwrap()).await.unwrap();

        assert_eq!(
            clients.actions(),
            vec![
                HostAction::Claim,
                HostAction::Focus { id: "w1".into() },
                HostAction::OpenWindow { url: "https://shop.test/cart".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_recording_notifier_records_show_then_close() {
        let notifier = RecordingNotifier::new();
        let notification = Notification {
            title: "New Update".into(),
            body: "Order shipped".into(),
            icon: "/logo192.png".into(),
            badge: "/logo192.png".into(),
            tag: Some("order".into()),
            data: None,
            require_interaction: false,
            vibrate: Vec::new(),
        };
        notifier.show(&notification).await.unwrap();
        notifier.close(&notification).await.unwrap();

        assert_eq!(notifier.shown(), vec![notification]);
        assert_eq!(notifier.actions()[1], HostAction::Close { tag: Some("order".into()) });
    }

    #[tokio::test]
    async fn test_focus_unknown_window_fails() {
        let clients = RecordingClients::new(Vec::new());
        let err = clients.focus("missing").await.unwrap_err();
        assert!(matches!(err, Error::Host(_)));
        assert!(clients.actions().is_empty());
    }

    #[test]
    fn test_window_client_focused_defaults_false() {
        let window: WindowClient = serde_json::from_str(r#"{"id":"w1","url":"https://shop.test/cart"}"#).unwrap();
        assert!(!window.focused);
    }

    #[test]
    fn test_host_action_serializes_tagged() {
        let json = serde_json::to_value(HostAction::OpenWindow { url: "https://shop.test/cart".into() }).unwrap();
        assert_eq!(json["action"], "open_window");
        assert_eq!(json["url"], "https://shop.test/cart");
    }
}
