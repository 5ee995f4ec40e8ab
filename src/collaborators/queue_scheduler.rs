//! # Built-in FIFO scheduler.
//!
//! [`QueueScheduler`] implements the [`Scheduler`] contract with a
//! submission channel and a background loop that mounts elements in request
//! order. It has no viewport or priority model beyond "asap jumps the queue".
//!
//! ## Architecture
//! ```text
//! Element ── schedule / schedule_asap / unschedule ──► mpsc (bounded)
//!                                                          │
//!                                                   scheduler loop
//!                                                 ┌────────┴────────┐
//!                                        pending queue        containers
//!                                      (asap at front)     (id → anchor)
//!                                                 │
//!                                    permit (optional semaphore)
//!                                                 ▼
//!                                   tokio::spawn(element.mount())
//! ```
//!
//! ## Rules
//! - Commands are applied in submission order; pending commands are always
//!   drained before the next element is dispatched.
//! - An element is queued at most once; `schedule_asap` moves it to the front.
//! - `unschedule` drops the pending request; an already dispatched mount is
//!   cancelled by the element itself (`Element::unmount`).
//! - A full channel drops the command with a warning (calls never block).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use super::scheduler::Scheduler;
use crate::core::{Element, ElementId};

enum Command {
    Schedule { element: Arc<Element>, asap: bool },
    Unschedule(ElementId),
}

/// FIFO scheduler mounting elements from a background loop.
pub struct QueueScheduler {
    tx: mpsc::Sender<Command>,
    containers: RwLock<HashMap<ElementId, Option<ElementId>>>,
}

impl QueueScheduler {
    /// Creates the scheduler and spawns its loop.
    ///
    /// - `queue_capacity`: command channel capacity (min 1)
    /// - `max_concurrent`: concurrent mounts cap (`None` = unlimited, see
    ///   [`HostConfig::mount_limit`](crate::HostConfig::mount_limit))
    ///
    /// The loop exits when `token` is cancelled or the scheduler is dropped.
    pub fn spawn(
        queue_capacity: usize,
        max_concurrent: Option<usize>,
        token: CancellationToken,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let semaphore = max_concurrent.map(|n| Arc::new(Semaphore::new(n.max(1))));
        tokio::spawn(run_loop(rx, semaphore, token));

        Arc::new(Self {
            tx,
            containers: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the scroll anchor recorded for a container element.
    ///
    /// `None` if the element is not a container; `Some(None)` for a container
    /// without anchor.
    pub fn container(&self, id: ElementId) -> Option<Option<ElementId>> {
        self.containers.read().get(&id).copied()
    }

    fn submit(&self, cmd: Command) {
        match self.tx.try_send(cmd) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("scheduler queue full; request dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("scheduler closed; request dropped");
            }
        }
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, element: &Arc<Element>) {
        self.submit(Command::Schedule {
            element: Arc::clone(element),
            asap: false,
        });
    }

    fn schedule_asap(&self, element: &Arc<Element>) {
        self.submit(Command::Schedule {
            element: Arc::clone(element),
            asap: true,
        });
    }

    fn unschedule(&self, element: &Element) {
        self.submit(Command::Unschedule(element.id()));
    }

    fn set_container(&self, element: &Element, scroll_anchor: Option<ElementId>) {
        self.containers.write().insert(element.id(), scroll_anchor);
    }

    fn remove_container(&self, element: &Element) {
        self.containers.write().remove(&element.id());
    }
}

async fn run_loop(
    mut rx: mpsc::Receiver<Command>,
    semaphore: Option<Arc<Semaphore>>,
    token: CancellationToken,
) {
    let mut pending: VecDeque<Arc<Element>> = VecDeque::new();

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            cmd = rx.recv() => match cmd {
                Some(cmd) => apply(cmd, &mut pending),
                None => break,
            },

            permit = next_permit(&semaphore), if !pending.is_empty() => {
                if let Some(element) = pending.pop_front() {
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(err) = element.mount().await {
                            tracing::debug!(element = %element.id(), label = err.as_label(), "scheduled mount settled with error");
                        }
                    });
                }
            }
        }
    }
}

fn apply(cmd: Command, pending: &mut VecDeque<Arc<Element>>) {
    match cmd {
        Command::Schedule { element, asap } => {
            let queued = pending.iter().position(|e| e.id() == element.id());
            match (queued, asap) {
                (Some(_), false) => {}
                (Some(at), true) => {
                    if let Some(e) = pending.remove(at) {
                        pending.push_front(e);
                    }
                }
                (None, false) => pending.push_back(element),
                (None, true) => pending.push_front(element),
            }
        }
        Command::Unschedule(id) => pending.retain(|e| e.id() != id),
    }
}

async fn next_permit(semaphore: &Option<Arc<Semaphore>>) -> Option<OwnedSemaphorePermit> {
    match semaphore {
        Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBehavior, TestHost, settle};
    use crate::{HostConfig, ReadyState};

    #[tokio::test]
    async fn test_scheduled_element_is_mounted() {
        let t = TestHost::with_queue_scheduler(HostConfig::default());
        let behavior = ScriptedBehavior::new_path();
        t.host.define("x-card", behavior.class("x-card")).expect("define");

        let el = t.host.create_element("x-card", Default::default());
        el.attach();
        el.when_mounted().await.expect("mounted");

        assert!(el.is_mounted());
        assert_eq!(el.ready_state(), ReadyState::Complete);
        assert_eq!(behavior.counts().mount, 1);
    }

    #[tokio::test]
    async fn test_mount_limit_caps_concurrent_mounts() {
        let cfg = HostConfig {
            max_concurrent_mounts: 1,
            ..HostConfig::default()
        };
        let t = TestHost::with_queue_scheduler(cfg);
        let behavior = ScriptedBehavior::new_path().loading_mount();
        t.host.define("x-video", behavior.class("x-video")).expect("define");

        let a = t.host.create_element("x-video", Default::default());
        let b = t.host.create_element("x-video", Default::default());
        a.attach();
        b.attach();
        settle().await;
        assert_eq!(behavior.counts().mount, 1);

        behavior.finish_loading();
        a.when_mounted().await.expect("a mounted");
        b.when_mounted().await.expect("b mounted");
        assert_eq!(behavior.counts().mount, 2);
    }

    #[tokio::test]
    async fn test_unschedule_before_dispatch_drops_request() {
        let t = TestHost::with_queue_scheduler(HostConfig::default());
        let behavior = ScriptedBehavior::new_path();
        t.host.define("x-card", behavior.class("x-card")).expect("define");

        let el = t.host.create_element("x-card", Default::default());
        el.attach();
        let scheduler = t.queue.clone().expect("queue scheduler");
        scheduler.unschedule(&el);
        settle().await;

        assert_eq!(behavior.counts().mount, 0);
        assert!(!el.is_mounted());
    }

    #[tokio::test]
    async fn test_containers_are_recorded() {
        let t = TestHost::with_queue_scheduler(HostConfig::default());
        t.host
            .define("x-list", ScriptedBehavior::new_path().class("x-list"))
            .expect("define");
        let el = t.host.create_element("x-list", Default::default());
        let scheduler = t.queue.clone().expect("queue scheduler");

        el.set_as_container(Some(ElementId(99)));
        assert_eq!(scheduler.container(el.id()), Some(Some(ElementId(99))));
        el.remove_as_container();
        assert_eq!(scheduler.container(el.id()), None);
    }

    #[tokio::test]
    async fn test_apply_dedups_and_asap_moves_to_front() {
        let t = TestHost::new();
        t.host
            .define("x-card", ScriptedBehavior::new_path().class("x-card"))
            .expect("define");
        let a = t.host.create_element("x-card", Default::default());
        let b = t.host.create_element("x-card", Default::default());

        let mut pending = VecDeque::new();
        apply(Command::Schedule { element: a.clone(), asap: false }, &mut pending);
        apply(Command::Schedule { element: b.clone(), asap: false }, &mut pending);
        apply(Command::Schedule { element: a.clone(), asap: false }, &mut pending);
        assert_eq!(pending.len(), 2);

        apply(Command::Schedule { element: b.clone(), asap: true }, &mut pending);
        let order: Vec<ElementId> = pending.iter().map(|e| e.id()).collect();
        assert_eq!(order, vec![b.id(), a.id()]);

        apply(Command::Unschedule(b.id()), &mut pending);
        assert_eq!(pending.len(), 1);
    }
}
