//! # Non-blocking event fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] hands every lifecycle event to each subscriber's own
//! bounded queue without waiting for any of them.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - Per-subscriber FIFO; no ordering across subscribers (use `seq`).
//! - Overflow drops the event for that subscriber only and publishes
//!   `SubscriberOverflow` (never for an overflow event itself).
//! - A panicking subscriber is isolated with `catch_unwind`; its worker keeps
//!   running. `AssertUnwindSafe` is used, so a subscriber panicking while
//!   holding its own lock may leave that state inconsistent.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Workers run until their queue closes ([`SubscriberSet::shutdown`] or drop).
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(worker(sub, rx, bus.clone())));
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to all subscribers (clones the event once).
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a shared event to all subscribers without blocking.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let overflow_evt = event.is_subscriber_overflow();

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !overflow_evt {
                tracing::warn!(subscriber = channel.name, reason, "event dropped for subscriber");
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to drain.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

async fn worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            let info = if let Some(msg) = panic.downcast_ref::<&'static str>() {
                (*msg).to_string()
            } else if let Some(msg) = panic.downcast_ref::<String>() {
                msg.clone()
            } else {
                "unknown panic".to_string()
            };
            tracing::error!(subscriber = sub.name(), %info, "subscriber panicked");
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::events::EventKind;

    struct Counter(AtomicUsize);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _ev: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn test_panicking_subscriber_is_isolated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let set = SubscriberSet::new(vec![counter.clone(), Arc::new(Panicky)], bus.clone());

        set.emit(&Event::new(EventKind::Built));
        set.emit(&Event::new(EventKind::Mounted));
        set.shutdown().await;

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert!(ev.reason.as_deref().unwrap_or("").contains("panicky"));
    }
}
