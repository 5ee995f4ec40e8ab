//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out and the built-in subscribers for lifecycle events broadcast
//! through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//!   Element ── publish(Event) ──► Bus ──► host listener ──► SubscriberSet
//!                                                              │
//!                                        ┌─────────────┬───────┴──────┐
//!                                        ▼             ▼              ▼
//!                                   ReadyTracker   LogWriter       custom
//! ```
//!
//! ## Subscriber types
//! - **Passive**: observe and react (logging, metrics, alerts)
//! - **Stateful**: keep a model of element state ([`ReadyTracker`])

#[cfg(feature = "logging")]
mod log;
mod ready;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use ready::ReadyTracker;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
