//! # Action invocations and the pre-build queue.
//!
//! An [`ActionInvocation`] submitted before the element is built is parked in
//! an [`ActionQueue`] and flushed, in submission order, right after the build
//! completes. After the flush the queue is sealed: later invocations run
//! immediately against the built behavior and never merge with the old queue.
//!
//! ```text
//! Unallocated ──push──► Pending([A, B, C]) ──flush──► Flushed
//!      └──────────────────── flush ─────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use super::element::Element;
use super::state::ElementId;
use crate::behaviors::BehaviorRef;
use crate::error::ElementError;
use crate::events::EventKind;

/// Trust level of the event that triggered an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ActionTrust {
    Low,
    #[default]
    Default,
    High,
}

/// A deferred command targeting a behavior method.
///
/// # Example
/// ```
/// use elementvisor::{ActionInvocation, ActionTrust};
///
/// let inv = ActionInvocation::new("play")
///     .with_arg("muted", "true")
///     .with_trust(ActionTrust::High);
///
/// assert_eq!(&*inv.method, "play");
/// assert_eq!(inv.args.get("muted").map(String::as_str), Some("true"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    /// Target method name.
    pub method: Arc<str>,
    pub args: BTreeMap<String, String>,
    /// Element that triggered the action, if any.
    pub source: Option<ElementId>,
    pub trust: ActionTrust,
    /// Caller-assigned id used to correlate invocations of one gesture.
    pub sequence_id: u64,
}

impl ActionInvocation {
    pub fn new(method: impl Into<Arc<str>>) -> Self {
        Self {
            method: method.into(),
            args: BTreeMap::new(),
            source: None,
            trust: ActionTrust::default(),
            sequence_id: 0,
        }
    }

    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: ElementId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_trust(mut self, trust: ActionTrust) -> Self {
        self.trust = trust;
        self
    }

    #[must_use]
    pub fn with_sequence_id(mut self, sequence_id: u64) -> Self {
        self.sequence_id = sequence_id;
        self
    }
}

/// Invocations parked until the first build completes.
#[derive(Debug, Default)]
pub(crate) enum ActionQueue {
    #[default]
    Unallocated,
    Pending(Vec<ActionInvocation>),
    Flushed,
}

impl ActionQueue {
    /// Appends an invocation, allocating the queue on first use.
    pub fn push(&mut self, invocation: ActionInvocation) {
        match self {
            ActionQueue::Pending(list) => list.push(invocation),
            ActionQueue::Unallocated | ActionQueue::Flushed => {
                *self = ActionQueue::Pending(vec![invocation]);
            }
        }
    }

    /// Seals the queue and returns what was parked, in submission order.
    pub fn take_for_flush(&mut self) -> Vec<ActionInvocation> {
        match std::mem::replace(self, ActionQueue::Flushed) {
            ActionQueue::Pending(list) => list,
            ActionQueue::Unallocated | ActionQueue::Flushed => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ActionQueue::Pending(list) => list.len(),
            ActionQueue::Unallocated | ActionQueue::Flushed => 0,
        }
    }

    pub fn is_flushed(&self) -> bool {
        matches!(self, ActionQueue::Flushed)
    }
}

impl Element {
    /// Submits an action.
    ///
    /// Before the element is built the invocation is queued and a build is
    /// requested; afterwards it runs immediately. An invocation submitted
    /// while the queue is being flushed runs after the queued ones, on any
    /// runtime flavor. Behavior failures are reported and published as
    /// [`EventKind::ActionFailed`], never returned.
    ///
    /// # Errors
    /// - [`ElementError::InTemplate`] for template content
    pub fn enqueue(self: &Arc<Self>, invocation: ActionInvocation) -> Result<(), ElementError> {
        if self.attributes().in_template {
            return Err(ElementError::InTemplate);
        }

        let _order = self.action_order.lock();
        let behavior = {
            let mut st = self.state.lock();
            if st.built {
                st.behavior.clone()
            } else {
                st.actions.push(invocation);
                drop(st);
                self.build()?;
                return Ok(());
            }
        };

        if let Some(behavior) = behavior {
            self.run_action(&behavior, &invocation, false);
        }
        Ok(())
    }

    /// Number of invocations waiting for the build.
    pub fn pending_actions(&self) -> usize {
        self.state.lock().actions.len()
    }

    pub(super) fn run_action(
        &self,
        behavior: &BehaviorRef,
        invocation: &ActionInvocation,
        deferred: bool,
    ) {
        if let Err(err) = behavior.execute_action(invocation, deferred) {
            tracing::warn!(
                element = %self.id(),
                method = %invocation.method,
                deferred,
                label = err.as_label(),
                "action failed"
            );
            self.publish(
                self.event(EventKind::ActionFailed)
                    .with_reason(format!("{}: {}", invocation.method, err.as_message())),
            );
            self.report(&err);
        }
    }
}
