//! Client code for swcache.
//!
//! This crate provides the network fetch pipeline, request classification,
//! the caching strategies, the install/activate lifecycle and push delivery,
//! tied together by [`ServiceWorker`].

pub mod classify;
pub mod fetch;
pub mod host;
pub mod lifecycle;
pub mod push;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testing;

pub use classify::{Classification, Classifier, PassReason, RequestClass};
pub use fetch::{FetchClient, FetchConfig, Network, canonicalize};
pub use host::{Clients, HostAction, Notifier, RecordingClients, RecordingNotifier, WindowClient};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleController, LifecycleState};
pub use push::{ClickAction, Notification, PushDispatcher};
pub use strategy::{FetchOutcome, ResponseSource, Strategy, StrategyEngine};
pub use worker::{ControlMessage, FetchDecision, MessageOutcome, RegistrationReport, ServiceWorker};
