//! # Lifecycle event bus.
//!
//! Every element publishes into one [`Bus`] per host; the host forwards what
//! it receives to the subscriber set.
//!
//! ```text
//!   Element 1 ──┐
//!   Element 2 ──┼──► Bus (broadcast) ──► host listener ──► SubscriberSet
//!   Element N ──┤
//!   SubscriberSet ┘  (overflow / panic reports)
//! ```
//!
//! ## Rules
//! - `publish` never waits; with no receiver the event is dropped.
//! - Capacity is shared by all receivers; a receiver that falls behind gets
//!   `RecvError::Lagged` and loses the oldest events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
