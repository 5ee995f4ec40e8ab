//! # Behavior registry - tag name → behavior class.
//!
//! The registry resolves an element's class when the element is created and
//! remembers elements created before their class was defined.
//!
//! ## Architecture
//! ```text
//! Host::create_element(tag) ──► bind(element)
//!                                 ├─► class known   ─► element.upgrade(class)
//!                                 └─► class unknown ─► stubbed[tag].push(Weak<Element>)
//!
//! define(tag, class) ──► classes[tag] = class
//!                    └─► drain stubbed[tag] ─► element.upgrade(class) (live ones)
//! ```
//!
//! ## Rules
//! - A tag is defined at most once.
//! - Stubbed elements are held weakly; dropped elements are skipped.
//! - Upgrades always run outside the registry lock.
//! - [`BehaviorRegistry::global`] is initialized on first use and lives for
//!   the whole process; hosts may also own private registries.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;

use super::class::BehaviorClass;
use crate::core::Element;
use crate::error::RuntimeError;

static GLOBAL: OnceLock<Arc<BehaviorRegistry>> = OnceLock::new();

#[derive(Default)]
struct Inner {
    classes: HashMap<Arc<str>, BehaviorClass>,
    stubbed: HashMap<Arc<str>, Vec<Weak<Element>>>,
}

/// Tag → class map plus the stubbed-element list.
#[derive(Default)]
pub struct BehaviorRegistry {
    inner: RwLock<Inner>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry (memoized on first use).
    pub fn global() -> Arc<BehaviorRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(BehaviorRegistry::new())))
    }

    /// Defines the class for `tag` and upgrades every element stubbed under it.
    pub fn define(&self, tag: &str, class: BehaviorClass) -> Result<(), RuntimeError> {
        let waiting = {
            let mut inner = self.inner.write();
            if inner.classes.contains_key(tag) {
                return Err(RuntimeError::DuplicateDefinition { tag: tag.into() });
            }
            inner.classes.insert(tag.into(), class.clone());
            inner.stubbed.remove(tag).unwrap_or_default()
        };

        tracing::debug!(tag, class = class.name(), stubbed = waiting.len(), "behavior defined");
        for element in waiting.iter().filter_map(Weak::upgrade) {
            element.upgrade(class.clone());
        }
        Ok(())
    }

    /// Returns the class defined for `tag`.
    pub fn lookup(&self, tag: &str) -> Option<BehaviorClass> {
        self.inner.read().classes.get(tag).cloned()
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.inner.read().classes.contains_key(tag)
    }

    /// Returns sorted list of defined tags.
    pub fn tags(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut tags: Vec<String> = inner.classes.keys().map(|t| t.to_string()).collect();
        tags.sort_unstable();
        tags
    }

    /// Number of live elements still waiting for `tag` to be defined.
    pub fn stubbed_count(&self, tag: &str) -> usize {
        self.inner
            .read()
            .stubbed
            .get(tag)
            .map_or(0, |list| list.iter().filter(|w| w.strong_count() > 0).count())
    }

    /// Binds a freshly created element to its class, or records it as stubbed.
    pub(crate) fn bind(&self, element: &Arc<Element>) {
        let class = {
            let mut inner = self.inner.write();
            match inner.classes.get(element.tag()) {
                Some(class) => Some(class.clone()),
                None => {
                    let list = inner.stubbed.entry(element.tag().into()).or_default();
                    list.retain(|w| w.strong_count() > 0);
                    list.push(Arc::downgrade(element));
                    None
                }
            }
        };
        if let Some(class) = class {
            element.upgrade(class);
        }
    }

    /// Forgets every class and stubbed element. Intended for tests.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.classes.clear();
        inner.stubbed.clear();
    }
}
