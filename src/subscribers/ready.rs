//! # Ready-state tracker with sequence-based ordering.
//!
//! Maintains the last observed [`ReadyState`] of every element, using event
//! sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! Element ──► Bus ──► host listener ──► SubscriberSet ──► ReadyTracker::update()
//!                                                                │
//!                                                                ▼
//!                                                 HashMap<ElementId, Entry>
//!                                               (id → {last_seq, state, tag})
//! ```
//!
//! ## Rules
//! - Only `ReadyStateChanged` changes the tracked state
//! - Other element events **update seq** but don't affect the state
//! - Events with `seq <= last_seq` are **rejected** (stale)
//! - Reads are **eventually consistent** (the worker runs asynchronously)

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{ElementId, ReadyState};
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

#[derive(Debug, Clone)]
struct Entry {
    last_seq: u64,
    state: ReadyState,
    tag: Option<Arc<str>>,
}

/// Per-element table of the last observed ready state.
///
/// The host always installs one; [`Host::stalled`](crate::Host::stalled)
/// and [`Host::errored`](crate::Host::errored) read from it.
pub struct ReadyTracker {
    state: RwLock<HashMap<ElementId, Entry>>,
    capacity: usize,
}

impl ReadyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
            capacity: 2048,
        }
    }

    /// Configure the queue capacity for this subscriber.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Applies an event if it is newer than the last one seen for its element.
    ///
    /// Returns `true` when the tracked ready state changed.
    pub fn update(&self, ev: &Event) -> bool {
        let Some(id) = ev.element else {
            return false;
        };

        let mut state = self.state.write();
        let entry = state.entry(id).or_insert(Entry {
            last_seq: 0,
            state: ReadyState::Upgrading,
            tag: ev.tag.clone(),
        });
        if ev.seq <= entry.last_seq && entry.last_seq != 0 {
            return false;
        }
        entry.last_seq = ev.seq;

        match (ev.kind, ev.ready_state) {
            (EventKind::ReadyStateChanged, Some(next)) => {
                entry.state = next;
                true
            }
            _ => false,
        }
    }

    /// Returns sorted ids of elements that have not settled yet.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ElementId> {
        self.collect(|s| !s.is_settled())
    }

    /// Returns sorted ids of elements whose last state is `Error`.
    #[must_use]
    pub fn errored(&self) -> Vec<ElementId> {
        self.collect(|s| s == ReadyState::Error)
    }

    /// Last observed state of one element.
    pub fn state_of(&self, id: ElementId) -> Option<ReadyState> {
        self.state.read().get(&id).map(|e| e.state)
    }

    /// Tag recorded for an element when it was first seen.
    pub fn tag_of(&self, id: ElementId) -> Option<Arc<str>> {
        self.state.read().get(&id).and_then(|e| e.tag.clone())
    }

    fn collect(&self, keep: impl Fn(ReadyState) -> bool) -> Vec<ElementId> {
        let state = self.state.read();
        let mut ids: Vec<ElementId> = state
            .iter()
            .filter(|(_, e)| keep(e.state))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ReadyTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscribe for ReadyTracker {
    async fn on_event(&self, ev: &Event) {
        self.update(ev);
    }

    fn name(&self) -> &'static str {
        "ReadyTracker"
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}
