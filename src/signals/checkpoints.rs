//! # Per-element checkpoint bus.
//!
//! [`Signals`] maps each [`Signal`] to a settle-once slot backed by
//! [`tokio::sync::watch`]. A slot is pending until the first `signal` or
//! `reject`; later settles are ignored.
//!
//! ## Slot generations
//! ```text
//! when(s) ──► subscribe to current slot ──► wait until settled
//!
//! reset(s):
//!   slot settled  ─► slot detached from the map (holders keep the outcome),
//!                    next when(s) gets a fresh pending slot
//!   slot pending  ─► untouched (waiters keep waiting)
//! ```
//!
//! ## Rules
//! - First settle wins (idempotent `signal`, ignored `reject` after resolve).
//! - Late waiters on a settled slot complete immediately.
//! - No ordering is enforced across checkpoints; callers decide when to signal.

use std::collections::HashMap;
use std::future::Future;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::signal::Signal;
use crate::error::ElementError;

/// Settlement state of one checkpoint.
#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Resolved(Instant),
    Rejected(ElementError),
}

impl Slot {
    #[inline]
    fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }
}

/// Named checkpoint → asynchronous outcome.
#[derive(Debug, Default)]
pub struct Signals {
    slots: Mutex<HashMap<Signal, watch::Sender<Slot>>>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the checkpoint (no-op if already settled).
    pub fn signal(&self, name: Signal) {
        self.settle(name, Slot::Resolved(Instant::now()));
    }

    /// Rejects the checkpoint with `cause` (no-op if already settled).
    pub fn reject(&self, name: Signal, cause: ElementError) {
        self.settle(name, Slot::Rejected(cause));
    }

    /// Returns the checkpoint to pending if it has settled.
    pub fn reset(&self, name: Signal) {
        let mut slots = self.slots.lock();
        if slots.get(&name).is_some_and(|tx| !tx.borrow().is_pending()) {
            slots.remove(&name);
        }
    }

    /// Waits until the checkpoint settles.
    ///
    /// The returned future is bound to the slot generation current at call
    /// time; a later `reset` does not affect it.
    pub fn when(&self, name: Signal) -> impl Future<Output = Result<(), ElementError>> + Send + use<> {
        let mut rx = self.sender(name).subscribe();
        async move {
            let settled = rx
                .wait_for(|slot| !slot.is_pending())
                .await
                .map_err(|_| ElementError::Disposed)?;
            match &*settled {
                Slot::Rejected(err) => Err(err.clone()),
                _ => Ok(()),
            }
        }
    }

    /// Returns when the checkpoint resolved, if it did.
    pub fn get(&self, name: Signal) -> Option<Instant> {
        let slots = self.slots.lock();
        match slots.get(&name).map(|tx| tx.borrow().clone()) {
            Some(Slot::Resolved(at)) => Some(at),
            _ => None,
        }
    }

    /// Returns the rejection cause, if the checkpoint was rejected.
    pub fn failure(&self, name: Signal) -> Option<ElementError> {
        let slots = self.slots.lock();
        match slots.get(&name).map(|tx| tx.borrow().clone()) {
            Some(Slot::Rejected(err)) => Some(err),
            _ => None,
        }
    }

    /// True once the checkpoint resolved or rejected.
    pub fn is_settled(&self, name: Signal) -> bool {
        let slots = self.slots.lock();
        slots.get(&name).is_some_and(|tx| !tx.borrow().is_pending())
    }

    fn settle(&self, name: Signal, outcome: Slot) {
        self.sender(name).send_if_modified(|slot| {
            if slot.is_pending() {
                *slot = outcome;
                true
            } else {
                false
            }
        });
    }

    fn sender(&self, name: Signal) -> watch::Sender<Slot> {
        self.slots
            .lock()
            .entry(name)
            .or_insert_with(|| watch::Sender::new(Slot::Pending))
            .clone()
    }
}
