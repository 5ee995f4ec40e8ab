//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by element controllers and
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Element` (transitions), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the host listener, which fans out to `SubscriberSet`
//!   (including the built-in `ReadyTracker`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
