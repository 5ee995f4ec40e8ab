//! # Subscriber trait.
//!
//! `Subscribe` is the extension point for observing element lifecycle events
//! (ready-state changes, builds, mounts, failures). Each subscriber is driven
//! by a dedicated worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they never block elements
//!   nor other subscribers.
//! - A full queue drops the event for that subscriber only and publishes
//!   `SubscriberOverflow`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use elementvisor::{Event, EventKind, Subscribe};
//!
//! struct LoadTimes;
//!
//! #[async_trait]
//! impl Subscribe for LoadTimes {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::LoadEnd {
//!             // record ev.at for ev.element ...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "load-times" }
//!     fn queue_capacity(&self) -> usize { 512 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs and overflow events).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue (min 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
