//! # Lifecycle events emitted by elements and the host runtime.
//!
//! [`EventKind`] groups what an element or the host can report:
//! - **Resolution events**: behavior binding (attached, stubbed, upgraded)
//! - **Lifecycle events**: build/mount/load flow and ready-state transitions
//! - **Runtime events**: subscriber health and action failures
//!
//! The [`Event`] struct carries the element handle, its tag and optional
//! payload such as the ready state, failure reason or applied size.
//!
//! ## Ordering
//! `seq` comes from one process-wide counter. Subscribers receive events on
//! independent queues, so compare `seq` rather than arrival order.
//!
//! ## Example
//! ```rust
//! use elementvisor::{ElementId, Event, EventKind, ReadyState};
//!
//! let ev = Event::new(EventKind::ReadyStateChanged)
//!     .with_element(ElementId(7), "media-player")
//!     .with_ready_state(ReadyState::Building);
//!
//! assert_eq!(ev.kind, EventKind::ReadyStateChanged);
//! assert_eq!(ev.tag.as_deref(), Some("media-player"));
//! assert_eq!(ev.ready_state, Some(ReadyState::Building));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::state::{ElementId, ReadyState, Size};
use crate::error::ElementError;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Resolution events ===
    /// Element attached while its behavior is still a stub.
    Stubbed,

    /// Behavior resolution completed; the element is attached to its behavior.
    ///
    /// Sets:
    /// - `element`, `tag`
    /// - `reason`: upgrade delay in milliseconds
    Attached,

    // === Lifecycle events ===
    /// Build pipeline completed.
    Built,

    /// Mount pipeline completed (new execution path).
    Mounted,

    /// Element was unmounted (new execution path) or unlaid out (legacy path).
    Unmounted,

    /// Loading phase started.
    LoadStart,

    /// Loading finished successfully.
    LoadEnd,

    /// Resources were released by an unlayout pass.
    Unload,

    /// Element entered the `Error` ready state.
    ///
    /// Sets:
    /// - `reason`: failure label and message
    Error,

    /// Behavior applied a new size.
    ///
    /// Sets:
    /// - `size`
    SizeChanged,

    /// Ready state changed.
    ///
    /// Sets:
    /// - `ready_state`: the new state
    ReadyStateChanged,

    // === Runtime events ===
    /// A queued or direct action invocation failed inside the behavior.
    ///
    /// Sets:
    /// - `reason`: method name and failure message
    ActionFailed,

    /// An event could not be queued for a subscriber.
    SubscriberOverflow,

    /// A subscriber panicked in `on_event`; its worker keeps running.
    SubscriberPanicked,
}

impl EventKind {
    /// Returns a short stable label (kebab-case).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Stubbed => "stubbed",
            EventKind::Attached => "attached",
            EventKind::Built => "built",
            EventKind::Mounted => "mounted",
            EventKind::Unmounted => "unmounted",
            EventKind::LoadStart => "load-start",
            EventKind::LoadEnd => "load-end",
            EventKind::Unload => "unload",
            EventKind::Error => "error",
            EventKind::SizeChanged => "size-changed",
            EventKind::ReadyStateChanged => "ready-state-changed",
            EventKind::ActionFailed => "action-failed",
            EventKind::SubscriberOverflow => "subscriber-overflow",
            EventKind::SubscriberPanicked => "subscriber-panicked",
        }
    }
}

/// One lifecycle event. Optional fields are filled depending on [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide ordering key.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Element the event belongs to.
    pub element: Option<ElementId>,
    /// Tag name of the element.
    pub tag: Option<Arc<str>>,
    /// New ready state (for `ReadyStateChanged`).
    pub ready_state: Option<ReadyState>,
    /// Failure text or diagnostic detail.
    pub reason: Option<Arc<str>>,
    /// Applied size (for `SizeChanged`).
    pub size: Option<Size>,
}

impl Event {
    /// Stamps a bare event with the next `seq` and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            element: None,
            tag: None,
            ready_state: None,
            reason: None,
            size: None,
        }
    }

    /// Attaches the element handle and tag.
    #[inline]
    pub fn with_element(mut self, id: ElementId, tag: impl Into<Arc<str>>) -> Self {
        self.element = Some(id);
        self.tag = Some(tag.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a failure as `label: message`.
    #[inline]
    pub fn with_error(self, err: &ElementError) -> Self {
        self.with_reason(err.as_message())
    }

    #[inline]
    pub fn with_ready_state(mut self, state: ReadyState) -> Self {
        self.ready_state = Some(state);
        self
    }

    #[inline]
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
