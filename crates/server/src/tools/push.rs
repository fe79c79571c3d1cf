//! sw_push, sw_notification_click and sw_notification_close tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use swcache_client::{ClickAction, HostAction, Notification, RecordingClients, RecordingNotifier, ServiceWorker};

use super::{WindowParam, json_result};

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push payload, usually a JSON object. Omit for an empty push.
    #[serde(default)]
    pub payload: Option<String>,
}

/// A notification previously shown, as handed back by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NotificationParam {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub badge: String,
    #[serde(default)]
    pub tag: Option<String>,
    /// Sender data; `type` selects click routing (`cart-add`, `checkout`).
    #[serde(default)]
    pub data: Option<Value>,
}

impl From<NotificationParam> for Notification {
    fn from(n: NotificationParam) -> Self {
        Notification {
            title: n.title,
            body: n.body,
            icon: n.icon,
            badge: n.badge,
            tag: n.tag,
            data: n.data,
            require_interaction: false,
            vibrate: Vec::new(),
        }
    }
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    pub notification: NotificationParam,

    /// Windows of the application currently open.
    #[serde(default)]
    pub windows: Vec<WindowParam>,
}

/// Parameters for the sw_notification_close tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationCloseParams {
    pub notification: NotificationParam,
}

#[derive(Debug, Serialize)]
pub struct SwPushOutput {
    pub notification: Notification,
    pub host_actions: Vec<HostAction>,
}

#[derive(Debug, Serialize)]
pub struct SwNotificationClickOutput {
    pub result: ClickAction,
    pub host_actions: Vec<HostAction>,
}

#[derive(Debug, Serialize)]
pub struct SwNotificationCloseOutput {
    pub closed: bool,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(worker: &ServiceWorker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notifier = RecordingNotifier::new();
    let payload = params.payload.as_deref().map(str::as_bytes);
    let notification = worker.on_push(payload, &notifier).await?;

    json_result(&SwPushOutput { notification, host_actions: notifier.actions() })
}

/// Implementation of the sw_notification_click tool.
pub async fn click_impl(
    worker: &ServiceWorker, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let notification = Notification::from(params.notification);
    let clients = RecordingClients::new(params.windows.into_iter().map(Into::into).collect());
    let notifier = RecordingNotifier::new();

    let result = worker
        .on_notification_click(&notification, &clients, &notifier)
        .await;

    let mut host_actions = notifier.actions();
    host_actions.extend(clients.actions());

    json_result(&SwNotificationClickOutput { result, host_actions })
}

/// Implementation of the sw_notification_close tool.
pub async fn close_impl(
    worker: &ServiceWorker, params: SwNotificationCloseParams,
) -> Result<CallToolResult, McpError> {
    worker.on_notification_close(&Notification::from(params.notification));

    json_result(&SwNotificationCloseOutput { closed: true })
}
