//! The intermediary: one object exposing a method per host event.
//!
//! A host adapter constructs a [`ServiceWorker`] once per process and feeds
//! it install, activate, fetch, message, push and notification events.
//! Everything it needs is injected here; it keeps no global state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use swcache_core::{AppConfig, CacheDb, Error, InterceptedRequest, PartitionManager, RequestKey};

use crate::classify::{Classification, Classifier, PassReason};
use crate::fetch::Network;
use crate::host::{Clients, Notifier};
use crate::lifecycle::{ActivateReport, InstallReport, LifecycleController, LifecycleState};
use crate::push::{ClickAction, Notification, PushDispatcher};
use crate::strategy::{FetchOutcome, Strategy, StrategyEngine};

/// What the host should do with an intercepted request.
#[derive(Debug)]
pub enum FetchDecision {
    /// Let the request reach the network untouched.
    Passthrough(PassReason),
    Respond(FetchOutcome),
}

/// Commands pages post to the running instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    ClearCache,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    SkipWaiting { transitioned: bool },
    ClearCache { deleted: Vec<String> },
    /// Not a control message.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    pub install: InstallReport,
    /// Present when install skipped waiting and activation ran.
    pub activate: Option<ActivateReport>,
}

pub struct ServiceWorker {
    classifier: Classifier,
    engine: StrategyEngine,
    lifecycle: LifecycleController,
    push: PushDispatcher,
    partitions: PartitionManager,
}

impl ServiceWorker {
    pub fn new(config: &AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config.origin_url()?;
        let partitions = PartitionManager::new(db, config.partition_set());

        let classifier = Classifier::from_config(config)?;
        let engine = StrategyEngine::new(partitions.clone(), network.clone(), &origin)
            .with_vary_headers(config.vary_headers.clone());
        let lifecycle = LifecycleController::new(partitions.clone(), network, config.shell_urls()?)
            .with_skip_waiting(config.skip_waiting_on_install)
            .with_vary_headers(config.vary_headers.clone());
        let push = PushDispatcher::new(config.notification.clone(), origin);

        Ok(Self { classifier, engine, lifecycle, push, partitions })
    }

    pub fn partitions(&self) -> &PartitionManager {
        &self.partitions
    }

    pub fn cache_key(&self, request: &InterceptedRequest) -> RequestKey {
        self.engine.key(request)
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.state().await
    }

    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.install().await
    }

    pub async fn on_activate(&self, clients: &dyn Clients) -> Result<ActivateReport, Error> {
        self.lifecycle.activate(clients).await
    }

    /// Install, then activate straight away if install skipped waiting.
    pub async fn register(&self, clients: &dyn Clients) -> Result<RegistrationReport, Error> {
        let install = self.on_install().await?;
        let activate = if install.skip_waiting { Some(self.on_activate(clients).await?) } else { None };
        Ok(RegistrationReport { install, activate })
    }

    pub async fn on_fetch(&self, request: &InterceptedRequest) -> Result<FetchDecision, Error> {
        match self.classifier.classify(request) {
            Classification::Passthrough(reason) => {
                tracing::trace!(url = %request.url(), method = request.method(), ?reason, "passthrough");
                Ok(FetchDecision::Passthrough(reason))
            }
            Classification::Intercept(class) => {
                let outcome = self.engine.run(Strategy::for_class(class), request).await?;
                Ok(FetchDecision::Respond(outcome))
            }
        }
    }

    /// Handle a message posted by a page. Anything that is not a known
    /// control message is ignored.
    pub async fn on_message(&self, message: &Value) -> Result<MessageOutcome, Error> {
        let message = match ControlMessage::deserialize(message) {
            Ok(message) => message,
            Err(_) => {
                tracing::debug!(%message, "ignoring message");
                return Ok(MessageOutcome::Ignored);
            }
        };

        match message {
            ControlMessage::SkipWaiting => {
                let transitioned = self.lifecycle.skip_waiting().await;
                Ok(MessageOutcome::SkipWaiting { transitioned })
            }
            ControlMessage::ClearCache => {
                let deleted = self.partitions.clear_current().await?;
                tracing::info!(deleted = deleted.len(), "cleared current partitions");
                Ok(MessageOutcome::ClearCache { deleted })
            }
        }
    }

    pub async fn on_push(&self, payload: Option<&[u8]>, notifier: &dyn Notifier) -> Result<Notification, Error> {
        self.push.receive(payload, notifier).await
    }

    pub async fn on_notification_click(
        &self, notification: &Notification, clients: &dyn Clients, notifier: &dyn Notifier,
    ) -> ClickAction {
        tracing::info!(tag = ?notification.tag, "notification clicked");
        self.push.click(notification, clients, notifier).await
    }

    pub fn on_notification_close(&self, notification: &Notification) {
        tracing::info!(tag = ?notification.tag, "notification closed");
    }
}
