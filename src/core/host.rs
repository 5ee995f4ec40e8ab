//! # Host: owns elements, collaborators and event delivery.
//!
//! The [`Host`] is the arena every [`Element`] lives in. It hands each element
//! the shared collaborator set, binds new elements to their behavior class and
//! forwards lifecycle events to subscribers.
//!
//! ## Architecture
//! ```text
//! create_element(tag) ──► Element::new ──► BehaviorRegistry::bind
//!                               │               ├─ class known ─► upgrade(class)
//!                               │               └─ unknown     ─► stubbed list
//!                               ▼
//!                      elements: ElementId → Arc<Element>
//!
//! Event flow:
//!   Element ── publish(Event) ──► Bus ──► host listener ──► SubscriberSet::emit(&Event)
//!                                                        ┌─────────┬─────────┐
//!                                                        ▼         ▼         ▼
//!                                                    [queue 1] [queue 2] [queue N]
//!                                                        │         │         │
//!                                                  ReadyTracker LogWriter  custom
//!
//! Shutdown:
//!   shutdown() ─► runtime token cancelled (listener + built-in scheduler stop)
//!              ─► detach + dispose every element
//!
//! Removal:
//!   remove_element(id) ─► arena entry dropped ─► detach ─► dispose
//!                         (pending pipelines settle with Disposed)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use elementvisor::{Behavior, BehaviorClass, BehaviorRef, ElementError, Host, HostConfig};
//!
//! struct Banner;
//!
//! #[async_trait]
//! impl Behavior for Banner {
//!     async fn build(&self) -> Result<(), ElementError> {
//!         Ok(())
//!     }
//!     fn is_new_execution_path(&self) -> bool {
//!         true
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Host::builder(HostConfig::default()).build();
//!     host.define("x-banner", BehaviorClass::new("banner", |_| Arc::new(Banner) as BehaviorRef))?;
//!
//!     let el = host.create_element("x-banner", Default::default());
//!     el.attach();
//!     el.when_mounted().await?;
//!
//!     host.shutdown();
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::builder::HostBuilder;
use super::config::HostConfig;
use super::element::{Element, ElementAttributes};
use super::services::Services;
use super::state::{ElementId, ElementInfo};
use crate::behaviors::{BehaviorClass, BehaviorRegistry};
use crate::error::RuntimeError;
use crate::events::Event;
use crate::subscribers::{ReadyTracker, SubscriberSet};

/// Arena of elements sharing one collaborator set and event pipeline.
pub struct Host {
    services: Arc<Services>,
    registry: Arc<BehaviorRegistry>,
    elements: RwLock<HashMap<ElementId, Arc<Element>>>,
    next_id: AtomicU64,
    subs: Arc<SubscriberSet>,
    ready: Arc<ReadyTracker>,
    token: CancellationToken,
}

impl Host {
    /// Starts a builder with the given configuration.
    pub fn builder(cfg: HostConfig) -> HostBuilder {
        HostBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        services: Arc<Services>,
        registry: Arc<BehaviorRegistry>,
        subs: Arc<SubscriberSet>,
        ready: Arc<ReadyTracker>,
        token: CancellationToken,
    ) -> Self {
        let host = Self {
            services,
            registry,
            elements: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            subs,
            ready,
            token,
        };
        host.subscriber_listener();
        host
    }

    /// Subscribes to the bus and forwards events to the subscriber set until shutdown.
    fn subscriber_listener(&self) {
        let mut rx = self.services.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let token = self.token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }

    /// Creates an element for `tag` and binds it to its behavior class.
    ///
    /// Elements whose tag is not defined yet start as stubs and are upgraded
    /// by a later [`Host::define`].
    pub fn create_element(&self, tag: &str, attrs: ElementAttributes) -> Arc<Element> {
        let id = ElementId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let info = ElementInfo { id, tag: tag.into() };
        let element = Element::new(info, attrs, Arc::clone(&self.services));

        self.elements.write().insert(id, Arc::clone(&element));
        self.registry.bind(&element);
        element
    }

    /// Defines the behavior class of `tag` and upgrades its stubbed elements.
    ///
    /// # Errors
    /// - [`RuntimeError::DuplicateDefinition`] if `tag` is already defined
    pub fn define(&self, tag: &str, class: BehaviorClass) -> Result<(), RuntimeError> {
        self.registry.define(tag, class)
    }

    pub fn element(&self, id: ElementId) -> Option<Arc<Element>> {
        self.elements.read().get(&id).cloned()
    }

    /// Returns all live elements, ordered by id.
    pub fn elements(&self) -> Vec<Arc<Element>> {
        let mut all: Vec<Arc<Element>> = self.elements.read().values().cloned().collect();
        all.sort_unstable_by_key(|e| e.id());
        all
    }

    /// Detaches the element and drops it from the arena for good.
    ///
    /// The element is disposed: its pending build and mount handles settle
    /// with [`ElementError::Disposed`](crate::ElementError::Disposed) and it is
    /// freed once callers drop their own references.
    ///
    /// # Errors
    /// - [`RuntimeError::ElementNotFound`] for unknown ids
    pub fn remove_element(&self, id: ElementId) -> Result<(), RuntimeError> {
        let element = self
            .elements
            .write()
            .remove(&id)
            .ok_or(RuntimeError::ElementNotFound { id: id.0 })?;
        element.detach();
        element.dispose();
        Ok(())
    }

    pub fn registry(&self) -> &Arc<BehaviorRegistry> {
        &self.registry
    }

    /// Receiver of every lifecycle event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.services.bus.subscribe()
    }

    pub fn config(&self) -> &HostConfig {
        &self.services.config
    }

    /// Elements that have not reached `Complete` yet (as seen by subscribers).
    pub fn stalled(&self) -> Vec<ElementId> {
        self.ready.snapshot()
    }

    /// Elements whose last observed ready state is `Error`.
    pub fn errored(&self) -> Vec<ElementId> {
        self.ready.errored()
    }

    /// Stops event delivery and the built-in scheduler, then detaches and
    /// disposes every element.
    pub fn shutdown(&self) {
        self.token.cancel();
        for element in self.elements() {
            element.detach();
            element.dispose();
        }
        tracing::debug!(elements = self.elements.read().len(), "host shut down");
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.token.cancel();
        for element in self.elements.get_mut().values() {
            element.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{ScriptedBehavior, TestHost, settle};
    use crate::{ActionInvocation, ElementError, EventKind, ReadyState, Signal};

    #[tokio::test]
    async fn test_create_element_assigns_unique_ids() {
        let t = TestHost::new();
        let a = t.host.create_element("x-a", Default::default());
        let b = t.host.create_element("x-a", Default::default());
        assert_ne!(a.id(), b.id());
        assert_eq!(t.host.elements().len(), 2);
        assert!(t.host.element(a.id()).is_some());
    }

    #[tokio::test]
    async fn test_remove_element_detaches_and_forgets() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path();
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        el.attach();
        el.mount().await.expect("mounted");

        t.host.remove_element(el.id()).expect("remove");
        assert!(t.host.element(el.id()).is_none());
        assert!(!el.is_connected());
        assert_eq!(behavior.counts().detached, 1);
        assert_eq!(behavior.counts().unmount, 1);
        assert_eq!(
            t.host.remove_element(el.id()),
            Err(RuntimeError::ElementNotFound { id: el.id().0 })
        );
    }

    #[tokio::test]
    async fn test_removed_element_with_pending_build_is_freed() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path();
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        el.attach();
        let pending = el.build().expect("handle");
        el.enqueue(ActionInvocation::new("toggle")).expect("queued");
        settle().await;

        let weak = Arc::downgrade(&el);
        t.host.remove_element(el.id()).expect("remove");
        assert!(el.is_disposed());
        drop(el);
        settle().await;

        assert!(weak.upgrade().is_none());
        assert_eq!(pending.await, Err(ElementError::Disposed));
        assert_eq!(behavior.counts().build, 0);
        assert_eq!(t.reporter.count(), 0);
    }

    #[tokio::test]
    async fn test_removed_stub_with_pending_build_is_freed() {
        let t = TestHost::new();
        let el = t.host.create_element("x-never", Default::default());
        el.attach();
        let pending = el.build().expect("handle");
        settle().await;

        let weak = Arc::downgrade(&el);
        t.host.remove_element(el.id()).expect("remove");
        drop(el);
        settle().await;

        assert!(weak.upgrade().is_none());
        assert_eq!(pending.await, Err(ElementError::Disposed));
    }

    #[tokio::test]
    async fn test_removed_element_with_deferred_upgrade_is_freed() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::legacy().gated_upgrade();
        t.host.define("x-img", behavior.class("x-img")).expect("define");
        let el = t.host.create_element("x-img", Default::default());
        el.attach();
        let pending = el.signals().when(Signal::Built);
        settle().await;

        let weak = Arc::downgrade(&el);
        t.host.remove_element(el.id()).expect("remove");
        drop(el);
        settle().await;

        assert!(weak.upgrade().is_none());
        assert_eq!(pending.await, Err(ElementError::Disposed));
    }

    #[tokio::test]
    async fn test_pipelines_after_dispose_settle_immediately() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path();
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        t.host.remove_element(el.id()).expect("remove");

        assert_eq!(el.mount().await, Err(ElementError::Disposed));
        assert_eq!(behavior.counts().mount, 0);
    }

    #[tokio::test]
    async fn test_ready_tracker_sees_stalled_and_errored_elements() {
        let t = TestHost::new();
        t.host
            .define("x-ok", ScriptedBehavior::new_path().class("x-ok"))
            .expect("define");
        t.host
            .define(
                "x-bad",
                ScriptedBehavior::new_path()
                    .fail_build(crate::ElementError::fail("boom"))
                    .class("x-bad"),
            )
            .expect("define");

        let ok = t.host.create_element("x-ok", Default::default());
        let bad = t.host.create_element("x-bad", Default::default());
        let idle = t.host.create_element("x-ok", Default::default());
        for el in [&ok, &bad, &idle] {
            el.attach();
        }
        ok.mount().await.expect("mounted");
        let _ = bad.mount().await;

        // Subscriber workers run asynchronously.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ok.ready_state(), ReadyState::Complete);
        assert_eq!(t.host.stalled(), vec![idle.id()]);
        assert_eq!(t.host.errored(), vec![bad.id()]);
    }

    #[tokio::test]
    async fn test_shutdown_detaches_everything() {
        let t = TestHost::new();
        let mut events = t.host.subscribe();
        t.host
            .define("x-img", ScriptedBehavior::legacy().class("x-img"))
            .expect("define");
        let el = t.host.create_element("x-img", Default::default());
        el.attach();
        settle().await;

        t.host.shutdown();
        assert!(!el.is_connected());
        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::Unmounted));
    }
}
