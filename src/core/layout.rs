//! # Legacy layout pipeline and visibility hooks.
//!
//! On the legacy execution path the resource manager drives layout passes
//! once the element is built. The first pass after a reset counts as the
//! element's load.
//!
//! ```text
//! layout_execute(token)
//!   ├─ preconditions: not template, legacy path, built, token live
//!   ├─ first pass? ─► signal LoadStart
//!   ├─ Behavior::layout().await
//!   ├─ ok  ─► LoadEnd + IniLoad (first pass), Complete, count += 1,
//!   │         first_layout_completed() once ever
//!   └─ err ─► reject LoadEnd (first pass), Error, count += 1, report
//!
//! unlayout_execute()
//!   └─ signal Unload ─► Behavior::unlayout() ─► relayout needed? reset pass
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::element::Element;
use super::state::{Markers, ReadyState};
use crate::error::{ElementError, Stage};
use crate::events::EventKind;
use crate::signals::Signal;

impl Element {
    /// Runs one layout pass (legacy path only).
    ///
    /// # Errors
    /// - [`ElementError::InTemplate`], [`ElementError::LegacyOnly`],
    ///   [`ElementError::NotBuilt`] for precondition violations
    /// - [`ElementError::Cancelled`] if `token` fired before or during the pass
    /// - [`ElementError::LayoutFailed`] when the behavior failed
    pub async fn layout_execute(self: &Arc<Self>, token: CancellationToken) -> Result<(), ElementError> {
        if self.attributes().in_template {
            return Err(ElementError::InTemplate);
        }
        if self.is_new_path() {
            return Err(ElementError::LegacyOnly { op: "layout" });
        }
        let (behavior, is_load) = {
            let st = self.state.lock();
            match (&st.behavior, st.built) {
                (Some(behavior), true) => (Arc::clone(behavior), st.layout_count == 0),
                _ => return Err(ElementError::NotBuilt),
            }
        };
        if token.is_cancelled() {
            return Err(ElementError::Cancelled);
        }

        self.signals.reset(Signal::Unload);
        if is_load {
            self.signals.signal(Signal::LoadStart);
        }
        self.state
            .lock()
            .markers
            .insert(Markers::LAYOUT | Markers::LOADING);
        if self.services.config.preconnect {
            behavior.preconnect(true);
        }

        let outcome = match behavior.layout().await {
            Ok(()) if token.is_cancelled() => Err(ElementError::Cancelled),
            Ok(()) => Ok(()),
            Err(err) => Err(err.classify(Stage::Layout)),
        };

        match outcome {
            Ok(()) => {
                if is_load {
                    self.signals.signal(Signal::LoadEnd);
                    self.signals.signal(Signal::IniLoad);
                }
                self.set_ready_state(ReadyState::Complete, None);
                let first_ever = {
                    let mut st = self.state.lock();
                    st.layout_count += 1;
                    st.markers.remove(Markers::LOADING);
                    !std::mem::replace(&mut st.first_layout_completed, true)
                };
                if first_ever {
                    behavior.first_layout_completed();
                }
                tracing::debug!(element = %self.id(), is_load, "layout completed");
                Ok(())
            }
            Err(ElementError::Cancelled) => {
                self.state.lock().markers.remove(Markers::LOADING);
                tracing::debug!(element = %self.id(), "layout cancelled");
                Err(ElementError::Cancelled)
            }
            Err(err) => {
                if is_load {
                    self.signals.reject(Signal::LoadEnd, err.clone());
                }
                self.set_ready_state(ReadyState::Error, Some(&err));
                {
                    let mut st = self.state.lock();
                    st.layout_count += 1;
                    st.markers.remove(Markers::LOADING);
                }
                tracing::warn!(element = %self.id(), label = err.as_label(), "layout failed");
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Reverses the current layout.
    ///
    /// Returns `true` when the behavior asked for a fresh layout on next
    /// visibility; the per-pass checkpoints are reset in that case. No-op
    /// (returns `false`) before the element is built.
    pub fn unlayout_execute(&self) -> bool {
        let behavior = {
            let st = self.state.lock();
            match (&st.behavior, st.built) {
                (Some(behavior), true) => Arc::clone(behavior),
                _ => return false,
            }
        };

        self.signals.signal(Signal::Unload);
        let relayout = behavior.unlayout();
        if relayout {
            self.reset_pass();
        }
        self.publish(self.event(EventKind::Unload));
        relayout
    }

    /// Pauses the behavior (no-op before build).
    ///
    /// On the legacy path an element that cannot stay laid out while paused
    /// is unlaid out as well.
    pub fn pause(&self) {
        let Some(behavior) = self.built_behavior() else {
            return;
        };
        behavior.pause();
        if !behavior.is_new_execution_path() && behavior.unlayout_on_pause() {
            self.unlayout_execute();
        }
    }

    /// Resumes the behavior (no-op before build).
    pub fn resume(&self) {
        if let Some(behavior) = self.built_behavior() {
            behavior.resume();
        }
    }

    fn built_behavior(&self) -> Option<crate::behaviors::BehaviorRef> {
        let st = self.state.lock();
        if st.built { st.behavior.clone() } else { None }
    }
}
