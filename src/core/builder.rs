use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::config::HostConfig;
use super::host::Host;
use super::services::Services;
use crate::behaviors::BehaviorRegistry;
use crate::collaborators::{
    ConsentPolicy, ErrorReporter, QueueScheduler, ResourceManager, ResourceTable, Scheduler,
    TracingReporter,
};
use crate::events::Bus;
use crate::subscribers::{ReadyTracker, Subscribe, SubscriberSet};

/// Builder for constructing a [`Host`] with optional collaborators.
///
/// Collaborators that are not set fall back to the built-in ones:
/// [`QueueScheduler`], [`ResourceTable`], [`TracingReporter`], no consent
/// gate and a private [`BehaviorRegistry`].
pub struct HostBuilder {
    cfg: HostConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    resources: Option<Arc<dyn ResourceManager>>,
    consent: Option<Arc<dyn ConsentPolicy>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    registry: Option<Arc<BehaviorRegistry>>,
}

impl HostBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: HostConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            scheduler: None,
            resources: None,
            consent: None,
            reporter: None,
            registry: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues. A [`ReadyTracker`] is always added by the host.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_resources(mut self, resources: Arc<dyn ResourceManager>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Enables the consent gate.
    pub fn with_consent(mut self, consent: Arc<dyn ConsentPolicy>) -> Self {
        self.consent = Some(consent);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Shares a behavior registry, e.g. [`BehaviorRegistry::global`].
    pub fn with_registry(mut self, registry: Arc<BehaviorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds and returns the host.
    ///
    /// Must be called inside a tokio runtime: the event listener, the
    /// subscriber workers and the built-in scheduler are spawned here.
    pub fn build(self) -> Arc<Host> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();

        let ready = Arc::new(ReadyTracker::new());
        let mut subscribers = self.subscribers;
        subscribers.push(ready.clone());
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));

        let scheduler = self.scheduler.unwrap_or_else(|| {
            QueueScheduler::spawn(
                self.cfg.scheduler_queue_capacity,
                self.cfg.mount_limit(),
                runtime_token.clone(),
            )
        });

        let services = Arc::new(Services {
            bus,
            scheduler,
            resources: self.resources.unwrap_or_else(|| ResourceTable::new()),
            consent: self.consent,
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
            config: self.cfg,
        });
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(BehaviorRegistry::new()));

        Arc::new(Host::new_internal(
            services,
            registry,
            subs,
            ready,
            runtime_token,
        ))
    }
}
