//! # Behavior abstractions and registry.
//!
//! This module provides the behavior-related types:
//! - [`Behavior`] - trait with the lifecycle hooks an element delegates to
//! - [`BehaviorRef`] - shared reference to a behavior (`Arc<dyn Behavior>`)
//! - [`BehaviorClass`] - named constructor, one behavior per element
//! - [`ElementClass`] - class slot of an element (stub or defined)
//! - [`BehaviorRegistry`] - tag name → class, with stubbed-element tracking

mod behavior;
mod class;
mod registry;

pub use behavior::{Behavior, BehaviorRef, HookFuture, MountOutcome, Upgrade};
pub use class::{BehaviorClass, ElementClass};
pub use registry::BehaviorRegistry;
