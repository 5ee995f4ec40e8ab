//! # Build pipeline.
//!
//! ```text
//! build()            (public, any caller)
//!   └─ when(Upgraded)
//!        ├─ new path ─► Scheduler::schedule_asap() ─► when(Built)
//!        └─ legacy   ─► build_internal()
//!
//! build_internal()   (resolved elements only, cached)
//!   ├─ ready = Building
//!   ├─ consent gate ── blocked ──► BlockedByConsent (not reported)
//!   ├─ Behavior::build()
//!   ├─ ok  ─► (ordering guard) built, markers NOT_BUILT → BUILT, signal Built,
//!   │         advance ready state, attached(), flush actions, placeholder
//!   └─ err ─► reject Built, Error (new path), report
//! ```
//!
//! A build that started runs to completion unless the element is disposed;
//! consumers that care about cancellation (mount) check their own token
//! around it.

use std::sync::Arc;

use super::element::{Element, PipelineHandle};
use super::state::{Markers, ReadyState, UpgradeState};
use crate::behaviors::BehaviorRef;
use crate::collaborators::ConsentRequest;
use crate::error::{ElementError, Stage};
use crate::events::EventKind;
use crate::signals::Signal;

impl Element {
    /// Requests a build and returns its shared handle.
    ///
    /// Repeated calls return the same handle. The handle first waits for the
    /// behavior to resolve; on the new execution path the scheduler is then
    /// asked to mount the element as soon as possible and the handle settles
    /// with the `Built` checkpoint.
    ///
    /// # Errors
    /// - [`ElementError::InTemplate`] for template content
    pub fn build(self: &Arc<Self>) -> Result<PipelineHandle, ElementError> {
        if self.attributes().in_template {
            return Err(ElementError::InTemplate);
        }

        let handle = {
            let mut st = self.state.lock();
            if let Some(handle) = st.build_request.as_ref().or(st.build.as_ref()) {
                return Ok(handle.clone());
            }
            let handle = self.pipeline(Arc::clone(self).request_build());
            st.build_request = Some(handle.clone());
            handle
        };
        tokio::spawn(handle.clone());
        Ok(handle)
    }

    async fn request_build(self: Arc<Self>) -> Result<(), ElementError> {
        self.signals.when(Signal::Upgraded).await?;
        if self.is_new_path() {
            self.services.scheduler.schedule_asap(&self);
            self.signals.when(Signal::Built).await
        } else {
            self.build_internal()?.await
        }
    }

    /// Starts (or joins) the build pipeline proper.
    ///
    /// Called by the resource manager on the legacy path and by the mount
    /// pipeline on the new path.
    ///
    /// # Errors
    /// - [`ElementError::InTemplate`] for template content
    /// - [`ElementError::NotUpgraded`] before the behavior resolved
    pub fn build_internal(self: &Arc<Self>) -> Result<PipelineHandle, ElementError> {
        if self.attributes().in_template {
            return Err(ElementError::InTemplate);
        }

        let handle = {
            let mut st = self.state.lock();
            if st.upgrade != UpgradeState::Resolved {
                return Err(ElementError::NotUpgraded);
            }
            if let Some(handle) = &st.build {
                return Ok(handle.clone());
            }
            let handle = self.pipeline(Arc::clone(self).run_build());
            st.build = Some(handle.clone());
            handle
        };

        self.set_ready_state(ReadyState::Building, None);
        tokio::spawn(handle.clone());
        Ok(handle)
    }

    async fn run_build(self: Arc<Self>) -> Result<(), ElementError> {
        let behavior = self.behavior().ok_or(ElementError::NotUpgraded)?;
        tracing::debug!(element = %self.id(), tag = %self.tag(), "build started");

        let outcome = async {
            self.consent_gate(&behavior).await?;
            behavior.build().await
        }
        .await
        .map_err(|err| err.classify(Stage::Build));

        match outcome {
            Ok(()) => {
                self.finish_build(&behavior);
                Ok(())
            }
            Err(err) => {
                self.fail_build(&err);
                Err(err)
            }
        }
    }

    async fn consent_gate(&self, behavior: &BehaviorRef) -> Result<(), ElementError> {
        let Some(request) = self.consent_request(behavior) else {
            return Ok(());
        };
        let Some(consent) = self.services.consent.clone() else {
            return Ok(());
        };
        if consent.evaluate(&request).await {
            Ok(())
        } else {
            Err(ElementError::BlockedByConsent)
        }
    }

    /// Policy from the attribute (or delegated to the behavior), else purposes.
    fn consent_request(&self, behavior: &BehaviorRef) -> Option<ConsentRequest> {
        let attrs = self.attributes();
        let policy = match attrs.block_on_consent.as_deref() {
            None => None,
            Some("") | Some("default") => behavior.consent_policy(),
            Some(id) => Some(id.to_string()),
        };
        match policy {
            Some(id) => Some(ConsentRequest::Policy(id)),
            None if !attrs.consent_purposes.is_empty() => {
                Some(ConsentRequest::Purposes(attrs.consent_purposes.clone()))
            }
            None => None,
        }
    }

    fn finish_build(self: &Arc<Self>, behavior: &BehaviorRef) {
        // Held until the queue is flushed; later submissions wait behind it.
        let _order = self.action_order.lock();
        let (actions, connected, has_placeholder) = {
            let mut st = self.state.lock();
            st.built = true;
            st.markers.remove(Markers::NOT_BUILT);
            st.markers.insert(Markers::BUILT);
            self.signals.signal(Signal::Built);
            (
                st.actions.take_for_flush(),
                st.connected,
                st.markers.contains(Markers::PLACEHOLDER),
            )
        };
        tracing::debug!(element = %self.id(), tag = %self.tag(), "built");
        self.publish(self.event(EventKind::Built));

        if self.is_new_path() {
            if self.ready_state() == ReadyState::Building {
                self.set_ready_state(ReadyState::Mounting, None);
            }
        } else {
            self.set_ready_state(ReadyState::Loading, None);
            if self.services.config.preconnect {
                behavior.preconnect(false);
            }
        }

        if connected {
            behavior.attached();
        }
        for invocation in &actions {
            self.run_action(behavior, invocation, true);
        }
        if !has_placeholder && behavior.create_placeholder() {
            self.state.lock().markers.insert(Markers::PLACEHOLDER);
        }
    }

    fn fail_build(&self, err: &ElementError) {
        self.signals.reject(Signal::Built, err.clone());
        if self.is_new_path() {
            self.set_ready_state(ReadyState::Error, Some(err));
        }
        if err.is_consent_blocked() {
            tracing::debug!(element = %self.id(), "build blocked by consent");
        } else {
            tracing::warn!(element = %self.id(), label = err.as_label(), "build failed");
        }
        self.report(err);
    }
}
