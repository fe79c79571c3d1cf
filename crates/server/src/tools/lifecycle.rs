//! sw_install, sw_activate, sw_message and sw_state tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use swcache_client::{
    ActivateReport, HostAction, InstallReport, LifecycleState, MessageOutcome, RecordingClients, ServiceWorker,
};

use super::{WindowParam, json_result};

/// Parameters for the sw_activate tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateParams {
    /// Windows currently open, which activation claims.
    #[serde(default)]
    pub windows: Vec<WindowParam>,
}

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// The message a page posted, e.g. `{"type": "CLEAR_CACHE"}`.
    pub message: Value,
}

#[derive(Debug, Serialize)]
pub struct SwInstallOutput {
    pub report: InstallReport,
    pub state: LifecycleState,
}

#[derive(Debug, Serialize)]
pub struct SwActivateOutput {
    pub report: ActivateReport,
    pub state: LifecycleState,
    pub host_actions: Vec<HostAction>,
}

#[derive(Debug, Serialize)]
pub struct SwMessageOutput {
    pub outcome: MessageOutcome,
    pub state: LifecycleState,
}

#[derive(Debug, Serialize)]
pub struct PartitionOutput {
    pub name: String,
    /// Belongs to the running version.
    pub current: bool,
    pub entries: u64,
}

#[derive(Debug, Serialize)]
pub struct SwStateOutput {
    pub state: LifecycleState,
    pub partitions: Vec<PartitionOutput>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.on_install().await?;
    let state = worker.state().await;

    json_result(&SwInstallOutput { report, state })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &ServiceWorker, params: SwActivateParams) -> Result<CallToolResult, McpError> {
    let clients = RecordingClients::new(params.windows.into_iter().map(Into::into).collect());
    let report = worker.on_activate(&clients).await?;
    let state = worker.state().await;

    json_result(&SwActivateOutput { report, state, host_actions: clients.actions() })
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &ServiceWorker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.on_message(&params.message).await?;
    let state = worker.state().await;

    json_result(&SwMessageOutput { outcome, state })
}

/// Implementation of the sw_state tool.
pub async fn state_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let partitions = worker.partitions();
    let mut output = Vec::new();
    for name in partitions.names().await? {
        let entries = partitions.db().count_entries(&name).await?;
        output.push(PartitionOutput { current: partitions.current().contains(&name), name, entries });
    }

    json_result(&SwStateOutput { state: worker.state().await, partitions: output })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tools::testing::{output, worker};

    #[tokio::test]
    async fn test_install_reports_cached_shell() {
        let (worker, _) = worker().await;

        let result = install_impl(&worker).await.unwrap();
        let out = output(&result);
        assert_eq!(out["report"]["cached"].as_array().unwrap().len(), 2);
        assert_eq!(out["state"], "activating");
    }

    #[tokio::test]
    async fn test_activate_claims_supplied_windows() {
        let (worker, _) = worker().await;
        install_impl(&worker).await.unwrap();

        let params = SwActivateParams {
            windows: vec![WindowParam { id: "w1".into(), url: "https://shop.test/".into(), focused: true }],
        };
        let result = activate_impl(&worker, params).await.unwrap();
        let out = output(&result);
        assert_eq!(out["state"], "active");
        assert_eq!(out["report"]["claimed"], true);
        assert_eq!(out["host_actions"][0]["action"], "claim");
    }

    #[tokio::test]
    async fn test_activate_before_install_is_rejected() {
        let (worker, _) = worker().await;

        let result = activate_impl(&worker, SwActivateParams::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clear_cache_message() {
        let (worker, _) = worker().await;
        install_impl(&worker).await.unwrap();

        let params = SwMessageParams { message: json!({"type": "CLEAR_CACHE"}) };
        let result = message_impl(&worker, params).await.unwrap();
        let out = output(&result);
        assert_eq!(out["outcome"]["outcome"], "clear_cache");
        assert_eq!(out["outcome"]["deleted"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_message_is_ignored() {
        let (worker, _) = worker().await;

        let params = SwMessageParams { message: json!({"type": "PING"}) };
        let result = message_impl(&worker, params).await.unwrap();
        assert_eq!(output(&result)["outcome"]["outcome"], "ignored");
    }

    #[tokio::test]
    async fn test_state_lists_partitions() {
        let (worker, _) = worker().await;
        worker.partitions().open_named("storefront-shell-v1").await.unwrap();
        install_impl(&worker).await.unwrap();

        let result = state_impl(&worker).await.unwrap();
        let out = output(&result);
        let partitions = out["partitions"].as_array().unwrap();
        let old = partitions.iter().find(|p| p["name"] == "storefront-shell-v1").unwrap();
        assert_eq!(old["current"], false);
        let shell = partitions.iter().find(|p| p["name"] == "storefront-shell-v2").unwrap();
        assert_eq!(shell["current"], true);
        assert_eq!(shell["entries"], 2);
    }
}
