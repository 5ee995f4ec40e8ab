//! # Resource-manager collaborator and the built-in [`ResourceTable`].
//!
//! Legacy-path elements register with a resource manager when attached. The
//! manager owns a table indexed by [`ResourceId`]; the element keeps only the
//! id, and the table keeps only a weak reference back to the element.
//!
//! ## Architecture
//! ```text
//! Element ──(ResourceId)──► ResourceTable[id] ──(Weak<Element>)──► Element
//!
//! attach   ─► add(element)  → id
//! upgrade  ─► upgraded(id)  → spawn build_internal()
//! host     ─► layout_pending() → layout_execute() for every resource that
//!                               is built, connected, displayed and not laid out
//! detach   ─► remove(id)
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::core::Element;

/// Index of an element inside a resource table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

/// Legacy-path resource bookkeeping.
pub trait ResourceManager: Send + Sync + 'static {
    /// Registers an element and returns its index.
    fn add(&self, element: &Arc<Element>) -> ResourceId;

    fn remove(&self, id: ResourceId);

    /// The element behind `id` finished behavior resolution.
    fn upgraded(&self, id: ResourceId);

    /// Visibility lookup for layout decisions.
    fn is_displayed(&self, id: ResourceId) -> bool;
}

struct Entry {
    element: Weak<Element>,
    displayed: bool,
    laying_out: bool,
}

/// Arena of legacy-path resources.
///
/// Builds elements eagerly once they are upgraded and runs layout passes on
/// demand through [`ResourceTable::layout_pending`].
pub struct ResourceTable {
    entries: Arc<RwLock<HashMap<ResourceId, Entry>>>,
    next_id: AtomicU64,
}

impl ResourceTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        })
    }

    /// Sets the displayed flag of a resource (new resources are displayed).
    pub fn set_displayed(&self, id: ResourceId, displayed: bool) {
        if let Some(entry) = self.entries.write().get_mut(&id) {
            entry.displayed = displayed;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the live element behind `id`.
    pub fn element(&self, id: ResourceId) -> Option<Arc<Element>> {
        self.entries.read().get(&id).and_then(|e| e.element.upgrade())
    }

    /// Runs one layout pass for every resource that needs it.
    ///
    /// A resource needs layout when its element is built, connected,
    /// displayed and has no completed pass since its last reset.
    /// Returns the number of passes that ran (successful or not).
    pub async fn layout_pending(&self) -> usize {
        let due: Vec<(ResourceId, Arc<Element>)> = {
            let mut entries = self.entries.write();
            entries
                .iter_mut()
                .filter(|(_, e)| e.displayed && !e.laying_out)
                .filter_map(|(id, e)| {
                    let element = e.element.upgrade()?;
                    let needs = element.is_connected()
                        && element.is_built()
                        && element.layout_count() == 0;
                    if needs {
                        e.laying_out = true;
                        Some((*id, element))
                    } else {
                        None
                    }
                })
                .collect()
        };

        let mut ran = 0;
        for (id, element) in due {
            if let Err(err) = element.layout_execute(CancellationToken::new()).await {
                tracing::debug!(resource = id.0, element = %element.id(), label = err.as_label(), "layout pass failed");
            }
            ran += 1;
            if let Some(entry) = self.entries.write().get_mut(&id) {
                entry.laying_out = false;
            }
        }
        ran
    }
}

impl ResourceManager for ResourceTable {
    fn add(&self, element: &Arc<Element>) -> ResourceId {
        let id = ResourceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().insert(
            id,
            Entry {
                element: Arc::downgrade(element),
                displayed: true,
                laying_out: false,
            },
        );
        id
    }

    fn remove(&self, id: ResourceId) {
        self.entries.write().remove(&id);
    }

    fn upgraded(&self, id: ResourceId) {
        let Some(element) = self.element(id) else {
            return;
        };
        match element.build_internal() {
            Ok(handle) => {
                tokio::spawn(async move {
                    // Failures are reported by the build pipeline itself.
                    let _ = handle.await;
                });
            }
            Err(err) => {
                tracing::debug!(resource = id.0, label = err.as_label(), "build not started");
            }
        }
    }

    fn is_displayed(&self, id: ResourceId) -> bool {
        self.entries.read().get(&id).is_some_and(|e| e.displayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBehavior, TestHost};
    use crate::{ElementError, ReadyState};

    #[tokio::test]
    async fn test_upgraded_builds_and_layout_pending_lays_out_once() {
        let table = ResourceTable::new();
        let t = TestHost::with_resources(table.clone());
        let behavior = ScriptedBehavior::legacy();
        t.host.define("x-img", behavior.class("x-img")).expect("define");

        let el = t.host.create_element("x-img", Default::default());
        el.attach();
        el.when_built().await.expect("built");
        assert_eq!(table.len(), 1);

        assert_eq!(table.layout_pending().await, 1);
        assert_eq!(el.ready_state(), ReadyState::Complete);
        assert_eq!(behavior.counts().layout, 1);

        assert_eq!(table.layout_pending().await, 0);
    }

    #[tokio::test]
    async fn test_hidden_resources_are_skipped() {
        let table = ResourceTable::new();
        let t = TestHost::with_resources(table.clone());
        let behavior = ScriptedBehavior::legacy();
        t.host.define("x-img", behavior.class("x-img")).expect("define");

        let el = t.host.create_element("x-img", Default::default());
        el.attach();
        el.when_built().await.expect("built");

        let id = el.resource_id().expect("registered");
        table.set_displayed(id, false);
        assert!(!table.is_displayed(id));
        assert_eq!(table.layout_pending().await, 0);

        table.set_displayed(id, true);
        assert_eq!(table.layout_pending().await, 1);
    }

    #[tokio::test]
    async fn test_failed_layout_is_not_retried() {
        let table = ResourceTable::new();
        let t = TestHost::with_resources(table.clone());
        let behavior = ScriptedBehavior::legacy().fail_layout(ElementError::fail("decode"));
        t.host.define("x-img", behavior.class("x-img")).expect("define");

        let el = t.host.create_element("x-img", Default::default());
        el.attach();
        el.when_built().await.expect("built");

        assert_eq!(table.layout_pending().await, 1);
        assert_eq!(el.ready_state(), ReadyState::Error);
        assert_eq!(table.layout_pending().await, 0);
    }

    #[tokio::test]
    async fn test_detach_removes_resource() {
        let table = ResourceTable::new();
        let t = TestHost::with_resources(table.clone());
        t.host
            .define("x-img", ScriptedBehavior::legacy().class("x-img"))
            .expect("define");

        let el = t.host.create_element("x-img", Default::default());
        el.attach();
        assert_eq!(table.len(), 1);
        el.detach();
        assert!(table.is_empty());
    }
}
