//! Scheduler collaborator contract.
//!
//! The scheduler decides **when** a new-path element is built and mounted.
//! The element only requests and withdraws scheduling; a scheduler eventually
//! calls [`Element::mount`](crate::Element::mount) for each scheduled element.

use std::sync::Arc;

use crate::core::{Element, ElementId};

/// Decides when scheduled elements are mounted.
///
/// All calls are fire-and-forget and must not block.
pub trait Scheduler: Send + Sync + 'static {
    /// Requests a mount whenever the scheduler sees fit.
    fn schedule(&self, element: &Arc<Element>);

    /// Requests a mount ahead of regular requests.
    fn schedule_asap(&self, element: &Arc<Element>);

    /// Withdraws any pending request for `element`.
    fn unschedule(&self, element: &Element);

    /// Marks `element` as a scrolling container, optionally anchored to another element.
    fn set_container(&self, element: &Element, scroll_anchor: Option<ElementId>);

    fn remove_container(&self, element: &Element);
}
