//! Install and activation lifecycle.
//!
//! Install pre-warms the shell partition from the manifest; individual
//! asset failures are reported but never abort the phase. Activation prunes
//! partitions left behind by older versions and claims open pages. Failing
//! to open or delete a partition aborts the phase it happened in.

use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use swcache_core::{Error, InterceptedRequest, Partition, PartitionKind, PartitionManager};

use crate::fetch::Network;
use crate::host::Clients;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Constructed; no lifecycle event seen yet.
    Parsed,
    Installing,
    /// Installed and waiting for pages of the previous version to close.
    Installed,
    Activating,
    Active,
    /// Install failed; this instance will never control pages.
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Shell URLs now in the shell partition.
    pub cached: Vec<String>,
    /// Shell URLs that could not be fetched or stored.
    pub failed: Vec<String>,
    /// Whether the instance skipped the waiting state.
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    /// Partitions of earlier versions that were deleted.
    pub deleted: Vec<String>,
    /// Whether open pages were claimed.
    pub claimed: bool,
}

pub struct LifecycleController {
    partitions: PartitionManager,
    network: Arc<dyn Network>,
    shell_urls: Vec<Url>,
    vary_headers: Vec<String>,
    skip_waiting_on_install: bool,
    state: RwLock<LifecycleState>,
}

impl LifecycleController {
    pub fn new(partitions: PartitionManager, network: Arc<dyn Network>, shell_urls: Vec<Url>) -> Self {
        Self {
            partitions,
            network,
            shell_urls,
            vary_headers: Vec::new(),
            skip_waiting_on_install: true,
            state: RwLock::new(LifecycleState::Parsed),
        }
    }

    /// Request headers that take part in the keys pre-cached entries are stored under.
    pub fn with_vary_headers(mut self, headers: Vec<String>) -> Self {
        self.vary_headers = headers;
        self
    }

    /// Whether install promotes the instance straight to `activating`.
    pub fn with_skip_waiting(mut self, enabled: bool) -> Self {
        self.skip_waiting_on_install = enabled;
        self
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    async fn set_state(&self, next: LifecycleState) {
        let mut state = self.state.write().await;
        let from = *state;
        tracing::debug!(%from, to = %next, "lifecycle transition");
        *state = next;
    }

    /// Pre-cache the shell manifest.
    ///
    /// # Errors
    ///
    /// `InvalidState` when already active; any error opening the shell
    /// partition, which also leaves the instance `redundant`.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        {
            let mut state = self.state.write().await;
            if *state == LifecycleState::Active {
                return Err(Error::InvalidState("cannot install an active instance".into()));
            }
            *state = LifecycleState::Installing;
        }
        tracing::info!(shell = self.partitions.current().name(PartitionKind::Shell), "installing");

        let shell = match self.partitions.open(PartitionKind::Shell).await {
            Ok(shell) => shell,
            Err(e) => {
                tracing::error!(error = %e, "install failed: shell partition unavailable");
                self.set_state(LifecycleState::Redundant).await;
                return Err(e);
            }
        };

        let results = join_all(self.shell_urls.iter().map(|url| self.precache(&shell, url))).await;

        let mut cached = Vec::new();
        let mut failed = Vec::new();
        for (url, result) in self.shell_urls.iter().zip(results) {
            match result {
                Ok(()) => cached.push(url.to_string()),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "shell asset not cached");
                    failed.push(url.to_string());
                }
            }
        }

        self.set_state(LifecycleState::Installed).await;
        tracing::info!(cached = cached.len(), failed = failed.len(), "shell pre-cached");

        let skip_waiting = self.skip_waiting_on_install && self.skip_waiting().await;
        Ok(InstallReport { cached, failed, skip_waiting })
    }

    async fn precache(&self, shell: &Partition, url: &Url) -> Result<(), Error> {
        let request = InterceptedRequest::get(url.clone());
        let response = self.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(Error::Network(format!("{url} returned {}", response.status)));
        }
        shell.put(&request.key(&self.vary_headers), &response).await
    }

    /// Move `installed` to `activating` without waiting for pages to close.
    ///
    /// Returns false, and changes nothing, from any other state.
    pub async fn skip_waiting(&self) -> bool {
        let mut state = self.state.write().await;
        let current = *state;
        if current != LifecycleState::Installed {
            tracing::debug!(state = %current, "skip-waiting ignored");
            return false;
        }
        *state = LifecycleState::Activating;
        tracing::info!("skipping wait; activating");
        true
    }

    /// Delete partitions of earlier versions and claim open pages.
    ///
    /// # Errors
    ///
    /// `InvalidState` before install has finished; any partition error,
    /// which restores the previous state.
    pub async fn activate(&self, clients: &dyn Clients) -> Result<ActivateReport, Error> {
        let previous = {
            let mut state = self.state.write().await;
            let previous = *state;
            match previous {
                LifecycleState::Installed | LifecycleState::Activating | LifecycleState::Active => {
                    *state = LifecycleState::Activating;
                }
                other => return Err(Error::InvalidState(format!("cannot activate from {other}"))),
            }
            previous
        };

        let keep = self.partitions.current().names();
        let deleted = match self.partitions.delete_all_except(&keep).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!(error = %e, "activation failed: could not prune partitions");
                self.set_state(previous).await;
                return Err(e);
            }
        };

        let claimed = match clients.claim().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to claim open pages");
                false
            }
        };

        self.set_state(LifecycleState::Active).await;
        tracing::info!(deleted = deleted.len(), claimed, "activated");

        Ok(ActivateReport { deleted, claimed })
    }
}
