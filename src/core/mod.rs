//! Runtime core: element lifecycle and the host arena.
//!
//! The public API from this module is [`Host`] (with [`HostBuilder`] and
//! [`HostConfig`]) and [`Element`], the per-instance lifecycle controller.
//!
//! Internal modules:
//! - [`element`]: controller state, attach/detach, resolution, ready state;
//! - [`build`]: consent-gated, deduplicated build pipeline;
//! - [`mount`]: cancellable mount and unmount (new execution path);
//! - [`layout`]: layout passes, pause and resume (legacy path);
//! - [`actions`]: action invocations and the pre-build queue;
//! - [`host`]: element arena, event delivery, shutdown.

mod actions;
mod build;
mod builder;
mod config;
mod element;
mod host;
mod layout;
mod mount;
mod services;
pub(crate) mod state;

pub use actions::{ActionInvocation, ActionTrust};
pub use builder::HostBuilder;
pub use config::HostConfig;
pub use element::{Element, ElementAttributes, PipelineHandle};
pub use host::Host;
pub use state::{ElementId, ElementInfo, Markers, ReadyState, Size, UpgradeState};
