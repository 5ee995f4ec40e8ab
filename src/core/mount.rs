//! # Mount / unmount pipeline (new execution path).
//!
//! ```text
//! mount()                       (cached per attempt)
//!   ├─ fresh CancellationToken
//!   ├─ when(Upgraded) ─► build_internal().await
//!   ├─ token cancelled? ─► Ok(())            (silent short-circuit)
//!   ├─ ready Mounting ─► Loading | Mounting
//!   ├─ Behavior::mount(token) ─► Mounted | Loading(fut).await
//!   ├─ token cancelled? ─► Err(Cancelled)    (handle cleared, not reported)
//!   └─ signal Mounted, Complete unless still loading
//!
//! unmount()
//!   ├─ pause() if connected
//!   ├─ legacy ─► unlayout_execute(), stop
//!   ├─ cancel token, Scheduler::unschedule()
//!   ├─ Behavior::unmount() if mounted
//!   ├─ reset per-pass checkpoints, drop cached mount
//!   └─ still connected ─► upgrade_or_schedule(no preconnect)
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::element::{Element, PipelineHandle};
use super::state::ReadyState;
use crate::behaviors::MountOutcome;
use crate::error::{ElementError, Stage};
use crate::events::EventKind;
use crate::signals::Signal;

impl Element {
    /// Starts (or joins) a mount attempt and returns its shared handle.
    ///
    /// Called by the scheduler. Calls made before the current attempt is
    /// unmounted return the same handle. A cancelled attempt clears the
    /// cached handle so the next call starts over.
    pub fn mount(self: &Arc<Self>) -> PipelineHandle {
        let handle = {
            let mut st = self.state.lock();
            if let Some(handle) = &st.mount {
                return handle.clone();
            }
            st.mount_attempt += 1;
            let attempt = st.mount_attempt;
            let token = CancellationToken::new();
            st.mount_token = Some(token.clone());

            let handle = self.pipeline(Arc::clone(self).run_mount(token, attempt));
            st.mount = Some(handle.clone());
            handle
        };
        tokio::spawn(handle.clone());
        handle
    }

    async fn run_mount(
        self: Arc<Self>,
        token: CancellationToken,
        attempt: u64,
    ) -> Result<(), ElementError> {
        let outcome = self.mount_steps(&token).await;
        let cancelled = matches!(outcome, Err(ElementError::Cancelled));

        {
            let mut st = self.state.lock();
            if st.mount_attempt == attempt {
                st.mount_token = None;
                if cancelled {
                    st.mount = None;
                }
            }
        }

        match &outcome {
            Ok(()) => {}
            Err(err) if cancelled => {
                tracing::debug!(element = %self.id(), attempt, label = err.as_label(), "mount cancelled");
            }
            Err(err) => {
                self.signals.reject(Signal::Mounted, err.clone());
                self.set_ready_state(ReadyState::Error, Some(err));
                // Build failures were reported by the build pipeline.
                if matches!(err, ElementError::MountFailed { .. }) {
                    tracing::warn!(element = %self.id(), attempt, label = err.as_label(), "mount failed");
                    self.report(err);
                }
            }
        }
        outcome
    }

    async fn mount_steps(self: &Arc<Self>, token: &CancellationToken) -> Result<(), ElementError> {
        self.signals.when(Signal::Upgraded).await?;
        self.build_internal()?.await?;
        if token.is_cancelled() {
            return Ok(());
        }

        let behavior = self.behavior().ok_or(ElementError::NotUpgraded)?;
        let uses_loading = behavior.uses_loading();
        if self.ready_state() == ReadyState::Mounting {
            let next = if uses_loading {
                ReadyState::Loading
            } else {
                ReadyState::Mounting
            };
            self.set_ready_state(next, None);
        }
        self.state.lock().mounted = true;

        let failed = |err: ElementError| {
            if token.is_cancelled() {
                ElementError::Cancelled
            } else {
                err.classify(Stage::Mount)
            }
        };
        let has_loaded = match behavior.mount(token.clone()).map_err(failed)? {
            MountOutcome::Mounted => false,
            MountOutcome::Loading(loading) => {
                loading.await.map_err(failed)?;
                true
            }
        };
        if token.is_cancelled() {
            return Err(ElementError::Cancelled);
        }

        self.signals.signal(Signal::Mounted);
        tracing::debug!(element = %self.id(), tag = %self.tag(), "mounted");
        self.publish(self.event(EventKind::Mounted));
        if !uses_loading || has_loaded {
            self.set_ready_state(ReadyState::Complete, None);
        }
        Ok(())
    }

    /// Tears down the current mount (or layout, on the legacy path).
    ///
    /// An in-flight mount is cancelled through its token; the element is
    /// rescheduled right away if it is still connected.
    pub fn unmount(self: &Arc<Self>) {
        if self.is_connected() {
            self.pause();
        }

        if !self.is_new_path() {
            self.unlayout_execute();
            self.publish(self.event(EventKind::Unmounted));
            return;
        }

        let (token, was_mounted, behavior) = {
            let mut st = self.state.lock();
            (st.mount_token.take(), st.mounted, st.behavior.clone())
        };
        if let Some(token) = token {
            token.cancel();
        }
        self.services.scheduler.unschedule(self);
        if was_mounted {
            if let Some(behavior) = behavior {
                behavior.unmount();
            }
        }

        {
            let mut st = self.state.lock();
            st.mounted = false;
            st.mount = None;
        }
        self.reset_pass();
        tracing::debug!(element = %self.id(), was_mounted, "unmounted");
        self.publish(self.event(EventKind::Unmounted));

        if self.is_connected() {
            self.upgrade_or_schedule(true);
        }
    }

    /// Returns the checkpoints of one mount/layout pass to pending.
    pub(super) fn reset_pass(&self) {
        for name in Signal::PER_PASS {
            self.signals.reset(name);
        }
        self.state.lock().layout_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{ScriptedBehavior, TestHost, settle};
    use crate::{ElementError, ReadyState, Signal};

    #[tokio::test]
    async fn test_mount_runs_build_then_mount_hook() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path();
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        el.attach();

        el.mount().await.expect("mounted");
        assert!(el.is_built());
        assert!(el.is_mounted());
        assert_eq!(el.ready_state(), ReadyState::Complete);
        assert!(el.signals().is_settled(Signal::Mounted));
        assert!(el.signals().is_settled(Signal::IniLoad));
        let counts = behavior.counts();
        assert_eq!((counts.build, counts.mount), (1, 1));
    }

    #[tokio::test]
    async fn test_concurrent_mount_calls_share_one_attempt() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path().gated_build();
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        el.attach();

        let a = el.mount();
        let b = el.mount();
        assert!(a.ptr_eq(&b));

        behavior.open_build();
        let (ra, rb) = futures::join!(a, b);
        assert!(ra.is_ok() && rb.is_ok());
        assert_eq!(behavior.counts().mount, 1);

        // Settled attempts stay cached until the element is unmounted.
        el.mount().await.expect("cached");
        assert_eq!(behavior.counts().mount, 1);

        el.unmount();
        el.mount().await.expect("second attempt");
        assert_eq!(behavior.counts().mount, 2);
    }

    #[tokio::test]
    async fn test_unmount_during_mount_never_signals_mounted() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path().loading_mount();
        t.host.define("x-video", behavior.class("x-video")).expect("define");
        let el = t.host.create_element("x-video", Default::default());
        el.attach();

        let handle = el.mount();
        settle().await;
        assert_eq!(behavior.counts().mount, 1);
        assert_eq!(el.ready_state(), ReadyState::Loading);

        el.unmount();
        behavior.finish_loading();
        assert_eq!(handle.await, Err(ElementError::Cancelled));

        assert!(!el.signals().is_settled(Signal::Mounted));
        assert!(!el.is_mounted());
        assert_eq!(behavior.counts().unmount, 1);
        assert_eq!(t.reporter.count(), 0);

        // The cancelled attempt is not cached; a new one starts fresh.
        let again = el.mount();
        settle().await;
        assert_eq!(behavior.counts().mount, 2);
        behavior.finish_loading();
        again.await.expect("mounted");
        assert!(el.signals().is_settled(Signal::Mounted));
    }

    #[tokio::test]
    async fn test_cancel_before_hook_is_silent() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path().gated_build();
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        el.attach();

        let handle = el.mount();
        settle().await;
        el.unmount();
        behavior.open_build();

        assert_eq!(handle.await, Ok(()));
        assert_eq!(behavior.counts().mount, 0);
        assert!(el.is_built());
        assert!(!el.is_mounted());
    }

    #[tokio::test]
    async fn test_mount_failure_rejects_and_reports_once() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path().fail_mount(ElementError::fail("no codec"));
        t.host.define("x-video", behavior.class("x-video")).expect("define");
        let el = t.host.create_element("x-video", Default::default());
        el.attach();

        let expected = ElementError::MountFailed { reason: "no codec".into() };
        assert_eq!(el.mount().await, Err(expected.clone()));
        assert_eq!(el.when_mounted().await, Err(expected));
        assert_eq!(el.ready_state(), ReadyState::Error);
        assert_eq!(t.reporter.count(), 1);
    }

    #[tokio::test]
    async fn test_build_failure_during_mount_is_reported_once() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path().fail_build(ElementError::fail("bad config"));
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        el.attach();

        let err = el.mount().await.expect_err("build fails");
        assert_eq!(err, ElementError::BuildFailed { reason: "bad config".into() });
        assert!(!el.is_mounted());
        assert_eq!(t.reporter.count(), 1);
    }

    #[tokio::test]
    async fn test_mounted_implies_built() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path().gated_build();
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        el.attach();

        let handle = el.mount();
        for _ in 0..4 {
            settle().await;
            assert!(!el.is_mounted() || el.is_built());
        }
        behavior.open_build();
        handle.await.expect("mounted");
        assert!(el.is_mounted() && el.is_built());
    }

    #[tokio::test]
    async fn test_unmount_resets_pass_and_reschedules() {
        let t = TestHost::new();
        let behavior = ScriptedBehavior::new_path();
        t.host.define("x-card", behavior.class("x-card")).expect("define");
        let el = t.host.create_element("x-card", Default::default());
        el.attach();
        el.mount().await.expect("mounted");
        el.render_started();

        for name in [Signal::LoadStart, Signal::LoadEnd, Signal::RenderStart] {
            assert!(el.signals().is_settled(name));
        }

        el.unmount();
        for name in [Signal::Mounted, Signal::LoadStart, Signal::LoadEnd, Signal::RenderStart] {
            assert!(!el.signals().is_settled(name));
        }
        assert!(el.signals().is_settled(Signal::Built));
        assert_eq!(t.scheduler.unscheduled(), vec![el.id()]);
        assert_eq!(t.scheduler.scheduled(), vec![el.id(), el.id()]);
        assert_eq!(el.ready_state(), ReadyState::Mounting);
        assert_eq!(behavior.counts().pause, 1);

        el.mount().await.expect("remounted");
        el.render_started();
        for name in [Signal::LoadStart, Signal::LoadEnd, Signal::RenderStart] {
            assert!(el.signals().is_settled(name));
        }
    }
}
