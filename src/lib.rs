//! # elementvisor
//!
//! **Elementvisor** is an async lifecycle controller for independently loaded
//! UI components embedded in a host document.
//!
//! It decides *when* a component's behavior is resolved, built, mounted, laid
//! out, paused and torn down, and *what happens* on failure or cancellation.
//! Rendering, geometry and fetching stay with the behavior and the external
//! collaborators (scheduler, resource manager, consent policy, error reporter).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   create_element(tag) ──► Host ──► BehaviorRegistry (tag → BehaviorClass)
//!                            │
//!            ┌───────────────┼────────────────┐
//!            ▼               ▼                ▼
//!     ┌────────────┐  ┌────────────┐   ┌────────────┐
//!     │  Element   │  │  Element   │   │  Element   │
//!     │ (signals,  │  │ (stub until│   │ (legacy:   │
//!     │  actions)  │  │  define)   │   │  layout)   │
//!     └─────┬──────┘  └────────────┘   └─────┬──────┘
//!           │ schedule / schedule_asap       │ add / upgraded
//!           ▼                                ▼
//!     ┌────────────┐                  ┌──────────────┐
//!     │ Scheduler  │── mount() ──►    │ResourceManager│── layout_execute()
//!     └────────────┘                  └──────────────┘
//!
//!   Element ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                      ├─► ReadyTracker
//!                                                      └─► LogWriter / custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! attach() ──► ReadyToUpgrade ──► resolve (Ready | Replace | Deferred)
//!                                    │
//!                                    ├─ Err ─► RESOLUTION_FAILED (reported)
//!                                    ▼
//!                               Upgraded, ready = building
//!                                    │
//!        new path                    │                    legacy path
//!   scheduler.schedule() ◄───────────┴──────────► resources.add() ─► build()
//!           │                                                          │
//!   mount(): build() ─► consent gate ─► Built ─► behavior.mount(token)   │
//!           │                                        │                 │
//!           │                  cancelled ─► Cancelled (handle cleared)  │
//!           ▼                                                          ▼
//!   Mounted ─► (loading?) ─► complete                 layout_execute() ─► complete
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                      |
//! |-------------------|-----------------------------------------------------------------|-----------------------------------------|
//! | **Elements**      | Per-instance lifecycle state machine and public operations.     | [`Element`], [`ReadyState`]             |
//! | **Behaviors**     | Pluggable implementations selected by tag name.                 | [`Behavior`], [`BehaviorRegistry`]      |
//! | **Signals**       | Named checkpoints that late waiters still observe.              | [`Signals`], [`Signal`]                 |
//! | **Collaborators** | Scheduling, resources, consent and error reporting seams.       | [`Scheduler`], [`ResourceManager`]      |
//! | **Subscriber API**| Hook into lifecycle events (logging, readiness tracking).       | [`Subscribe`], [`ReadyTracker`]         |
//! | **Errors**        | Typed errors for pipelines and the host.                        | [`ElementError`], [`RuntimeError`]      |
//! | **Configuration** | Centralize host settings.                                       | [`HostConfig`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use elementvisor::{Behavior, BehaviorClass, BehaviorRef, ElementAttributes, ElementError, Host, HostConfig};
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
//!     let el = host.create_element("x-banner", ElementAttributes::default());
//!     el.attach();
//!     el.when_mounted().await?;
//!     println!("{} is {}", el.tag(), el.ready_state());
//!
//!     host.shutdown();
//!     Ok(())
//! }
//! ```
mod behaviors;
mod collaborators;
mod core;
mod error;
mod events;
mod signals;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use behaviors::{
    Behavior, BehaviorClass, BehaviorRef, BehaviorRegistry, ElementClass, HookFuture,
    MountOutcome, Upgrade,
};
pub use collaborators::{
    ConsentPolicy, ConsentRequest, ErrorReporter, QueueScheduler, ResourceId, ResourceManager,
    ResourceTable, Scheduler, TracingReporter,
};
pub use crate::core::{
    ActionInvocation, ActionTrust, Element, ElementAttributes, ElementId, ElementInfo, Host,
    HostBuilder, HostConfig, Markers, PipelineHandle, ReadyState, Size, UpgradeState,
};
pub use error::{ElementError, RuntimeError, Stage};
pub use events::{Bus, Event, EventKind};
pub use signals::{Signal, Signals};
pub use subscribers::{ReadyTracker, Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
