//! # Element: the per-instance lifecycle controller.
//!
//! An [`Element`] is the unit the host manages. It binds to a behavior
//! (upgrade), builds it behind the consent gate, and then either mounts it
//! when the scheduler decides to (new execution path) or lays it out on demand
//! through the resource manager (legacy path).
//!
//! ## State
//! ```text
//! upgrade:  NotResolved ──► Resolving ──► Resolved
//!                                   └───► ResolutionFailed   (terminal)
//!
//! ready:    Upgrading ─► Building ─► Mounting ─► Loading ─► Complete
//!                           └──────────┴───────────┴──► Error
//! ```
//!
//! ## Attach flow
//! ```text
//! attach()
//!   ├─ stub class   ─► markers += UNRESOLVED, publish Stubbed (wait for define)
//!   ├─ in template  ─► stop
//!   └─ connect_behavior()
//!        ├─ resolve_behavior()  (NotResolved → Resolving → Resolved)
//!        ├─ new path ─► upgrade_or_schedule() ─► Scheduler::schedule()
//!        └─ legacy   ─► ResourceManager::add() ─► upgraded() ─► build_internal()
//! ```
//!
//! ## Rules
//! - State lives behind one mutex that is never held across an `.await` and
//!   never while calling into a behavior or a collaborator.
//! - Action submission and the post-build flush share a re-entrant ordering
//!   guard, so queued actions always run before later submissions.
//! - Pipelines (build, mount) are [`PipelineHandle`]s: shared, cached, and
//!   driven by a spawned task so they progress without callers.
//! - Every pipeline races the element's teardown token; [`Element::dispose`]
//!   settles pending handles with `Disposed` and drops them from state.
//! - Failures become checkpoint rejections, an `Error` ready state and one
//!   report; consent blocking and cancellation are never reported.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::{Mutex, ReentrantMutex};
use tokio_util::sync::CancellationToken;

use super::actions::ActionQueue;
use super::services::Services;
use super::state::{ElementId, ElementInfo, Markers, ReadyState, Size, UpgradeState};
use crate::behaviors::{BehaviorClass, BehaviorRef, ElementClass, Upgrade};
use crate::collaborators::ResourceId;
use crate::error::{ElementError, Stage};
use crate::events::{Event, EventKind};
use crate::signals::{Signal, Signals};

/// Shared handle to an in-flight or settled pipeline (build or mount).
///
/// Every clone resolves to the same outcome.
pub type PipelineHandle = Shared<BoxFuture<'static, Result<(), ElementError>>>;

/// Host-provided attributes of an element.
///
/// # Example
/// ```
/// use elementvisor::ElementAttributes;
///
/// let attrs = ElementAttributes::default().with_consent_policy("ads");
/// assert_eq!(attrs.block_on_consent.as_deref(), Some("ads"));
/// assert!(!attrs.in_template);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementAttributes {
    /// Consent policy gating the build.
    ///
    /// `""` or `"default"` delegate the choice to the behavior.
    pub block_on_consent: Option<String>,
    /// Consent purposes used when no policy applies.
    pub consent_purposes: Vec<String>,
    /// Element is inert template content; it never builds.
    pub in_template: bool,
}

impl ElementAttributes {
    #[must_use]
    pub fn with_consent_policy(mut self, policy: impl Into<String>) -> Self {
        self.block_on_consent = Some(policy.into());
        self
    }

    #[must_use]
    pub fn with_consent_purposes<I, S>(mut self, purposes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consent_purposes = purposes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn inside_template(mut self) -> Self {
        self.in_template = true;
        self
    }
}

/// Mutable controller state (guarded by [`Element::state`]).
#[derive(Default)]
pub(super) struct ElementState {
    pub class: ElementClass,
    pub behavior: Option<BehaviorRef>,
    pub upgrade: UpgradeState,
    pub upgrade_started: Option<Instant>,
    pub upgrade_delay: Option<Duration>,
    pub ready: ReadyState,
    pub markers: Markers,

    pub connected: bool,
    pub ever_attached: bool,
    pub built: bool,
    pub mounted: bool,

    pub actions: ActionQueue,
    /// Build pipeline proper (consent gate + build hook).
    pub build: Option<PipelineHandle>,
    /// Public build request (waits for upgrade, then defers to the path).
    pub build_request: Option<PipelineHandle>,
    pub mount: Option<PipelineHandle>,
    pub mount_token: Option<CancellationToken>,
    pub mount_attempt: u64,

    pub layout_count: u32,
    pub first_layout_completed: bool,
    pub resource: Option<ResourceId>,
    pub size: Option<Size>,
}

/// Lifecycle controller of one managed component instance.
pub struct Element {
    info: ElementInfo,
    attrs: ElementAttributes,
    pub(super) services: Arc<Services>,
    pub(super) signals: Signals,
    pub(super) state: Mutex<ElementState>,
    /// Orders action execution (taken before `state`).
    pub(super) action_order: ReentrantMutex<()>,
    teardown: CancellationToken,
}

impl Element {
    pub(crate) fn new(info: ElementInfo, attrs: ElementAttributes, services: Arc<Services>) -> Arc<Self> {
        let state = ElementState {
            markers: Markers::NOT_BUILT,
            ..ElementState::default()
        };
        Arc::new(Self {
            info,
            attrs,
            services,
            signals: Signals::new(),
            state: Mutex::new(state),
            action_order: ReentrantMutex::new(()),
            teardown: CancellationToken::new(),
        })
    }

    /// Wraps a pipeline body into a cached handle that settles with
    /// [`ElementError::Disposed`] once the element is torn down.
    pub(super) fn pipeline<F>(&self, body: F) -> PipelineHandle
    where
        F: Future<Output = Result<(), ElementError>> + Send + 'static,
    {
        let teardown = self.teardown.clone();
        async move {
            tokio::select! {
                biased;
                _ = teardown.cancelled() => Err(ElementError::Disposed),
                outcome = body => outcome,
            }
        }
        .boxed()
        .shared()
    }

    /// Tears the element down for good.
    ///
    /// Pending build and mount handles settle with [`ElementError::Disposed`]
    /// and are dropped from state, together with the current mount token.
    /// Called by the host when the element leaves the arena.
    pub(crate) fn dispose(&self) {
        self.teardown.cancel();
        let token = {
            let mut st = self.state.lock();
            st.build_request = None;
            st.build = None;
            st.mount = None;
            st.mount_token.take()
        };
        if let Some(token) = token {
            token.cancel();
        }
        tracing::debug!(element = %self.id(), tag = %self.tag(), "disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.teardown.is_cancelled()
    }

    // === Host tree ===

    /// Connects the element to the host tree.
    ///
    /// The first attach resolves the behavior (if its class is known) and
    /// hands the element to the scheduler or the resource manager. Repeated
    /// attaches while connected are ignored.
    pub fn attach(self: &Arc<Self>) {
        let (first, stub, built) = {
            let mut st = self.state.lock();
            if st.connected {
                return;
            }
            st.connected = true;
            let first = !st.ever_attached;
            st.ever_attached = true;
            if first {
                st.markers.insert(Markers::ELEMENT);
            }
            let stub = st.class.is_stub();
            if stub {
                st.markers.insert(Markers::UNRESOLVED);
            }
            let built = if st.built { st.behavior.clone() } else { None };
            (first, stub, built)
        };

        if stub {
            if first {
                tracing::debug!(element = %self.id(), tag = %self.tag(), "attached as stub");
                self.publish(self.event(EventKind::Stubbed));
            }
            return;
        }
        self.signals.signal(Signal::ReadyToUpgrade);

        if self.attrs.in_template {
            return;
        }
        if let Some(behavior) = built {
            behavior.attached();
        }
        self.connect_behavior();
    }

    /// Disconnects the element from the host tree.
    ///
    /// New path: unmounts. Legacy path: unlays out and leaves the resource
    /// manager.
    pub fn detach(self: &Arc<Self>) {
        let built = {
            let mut st = self.state.lock();
            if !st.connected {
                return;
            }
            st.connected = false;
            if st.built { st.behavior.clone() } else { None }
        };
        if self.attrs.in_template {
            return;
        }
        if let Some(behavior) = built {
            behavior.detached();
        }

        self.unmount();
        if !self.is_new_path() {
            let resource = self.state.lock().resource.take();
            if let Some(id) = resource {
                self.services.resources.remove(id);
            }
        }
    }

    /// Binds a stubbed element to its now-known class.
    ///
    /// No-op inside templates, after resolution started, or when the element
    /// already has a class. If the element was attached before, resolution
    /// and scheduling run right away.
    pub fn upgrade(self: &Arc<Self>, class: BehaviorClass) {
        if self.attrs.in_template {
            return;
        }
        let reconnect = {
            let mut st = self.state.lock();
            if st.upgrade != UpgradeState::NotResolved || !st.class.is_stub() {
                return;
            }
            st.class = ElementClass::Defined(class);
            st.ever_attached && st.connected
        };
        self.signals.signal(Signal::ReadyToUpgrade);
        if reconnect {
            self.connect_behavior();
        }
    }

    fn connect_behavior(self: &Arc<Self>) {
        self.resolve_behavior();
        if self.is_new_path() {
            self.upgrade_or_schedule(false);
            return;
        }

        let (existing, resolved) = {
            let st = self.state.lock();
            (st.resource, st.upgrade == UpgradeState::Resolved)
        };
        if existing.is_some() {
            return;
        }
        let id = self.services.resources.add(self);
        self.state.lock().resource = Some(id);
        if resolved {
            self.services.resources.upgraded(id);
        }
    }

    // === Resolution ===

    fn resolve_behavior(self: &Arc<Self>) {
        let class = {
            let st = self.state.lock();
            if st.upgrade != UpgradeState::NotResolved {
                return;
            }
            match &st.class {
                ElementClass::Defined(class) => class.clone(),
                ElementClass::Stub => return,
            }
        };
        if self.attrs.in_template {
            return;
        }

        let behavior = class.construct(&self.info);
        {
            let mut st = self.state.lock();
            if st.upgrade != UpgradeState::NotResolved {
                return;
            }
            st.upgrade = UpgradeState::Resolving;
            st.upgrade_started = Some(Instant::now());
            st.behavior = Some(Arc::clone(&behavior));
        }
        tracing::debug!(element = %self.id(), class = class.name(), "resolving behavior");

        match behavior.upgrade() {
            Upgrade::Ready => self.complete_upgrade(behavior),
            Upgrade::Replace(replacement) => self.complete_upgrade(replacement),
            Upgrade::Deferred(pending) => {
                let this = Arc::downgrade(self);
                let teardown = self.teardown.clone();
                tokio::spawn(async move {
                    let outcome = tokio::select! {
                        _ = teardown.cancelled() => return,
                        outcome = pending => outcome,
                    };
                    let Some(this) = this.upgrade() else {
                        return;
                    };
                    match outcome {
                        Ok(replacement) => this.complete_upgrade(replacement.unwrap_or(behavior)),
                        Err(err) => this.fail_upgrade(err),
                    }
                });
            }
        }
    }

    fn complete_upgrade(self: &Arc<Self>, behavior: BehaviorRef) {
        let (delay, resource) = {
            let mut st = self.state.lock();
            st.behavior = Some(behavior);
            st.upgrade = UpgradeState::Resolved;
            st.upgrade_delay = st.upgrade_started.map(|at| at.elapsed());
            st.markers.remove(Markers::UNRESOLVED);
            (st.upgrade_delay.unwrap_or_default(), st.resource)
        };
        tracing::debug!(element = %self.id(), delay_ms = delay.as_millis() as u64, "behavior resolved");

        self.set_ready_state(ReadyState::Building, None);
        self.publish(
            self.event(EventKind::Attached)
                .with_reason(format!("{}ms", delay.as_millis())),
        );
        self.signals.signal(Signal::Upgraded);

        if !self.is_new_path() {
            if let Some(id) = resource {
                self.services.resources.upgraded(id);
            }
        }
    }

    fn fail_upgrade(&self, err: ElementError) {
        let err = err.classify(Stage::Resolution);
        self.state.lock().upgrade = UpgradeState::ResolutionFailed;
        tracing::warn!(element = %self.id(), label = err.as_label(), "behavior resolution failed");
        self.signals.reject(Signal::Upgraded, err.clone());
        self.report(&err);
    }

    // === Scheduling ===

    pub(super) fn upgrade_or_schedule(self: &Arc<Self>, disable_preconnect: bool) {
        self.resolve_behavior();
        if self.attrs.in_template {
            return;
        }

        let (built, behavior) = {
            let st = self.state.lock();
            if st.mount.is_some() {
                return;
            }
            (st.built, st.behavior.clone())
        };
        self.services.scheduler.schedule(self);

        if built {
            self.set_ready_state(ReadyState::Mounting, None);
        } else {
            self.set_ready_state(ReadyState::Building, None);
            if !disable_preconnect && self.services.config.preconnect {
                if let Some(behavior) = behavior {
                    behavior.preconnect(false);
                }
            }
        }
    }

    /// Marks the element as a scrolling container for the scheduler.
    pub fn set_as_container(&self, scroll_anchor: Option<ElementId>) {
        self.services.scheduler.set_container(self, scroll_anchor);
    }

    pub fn remove_as_container(&self) {
        self.services.scheduler.remove_container(self);
    }

    // === Ready state ===

    /// Moves the coarse ready state and applies its side effects.
    ///
    /// Setting the current state again is a no-op. `failure` is the payload
    /// of an `Error` transition.
    pub(super) fn set_ready_state(&self, state: ReadyState, failure: Option<&ElementError>) {
        let new_path = self.is_new_path();
        {
            let mut st = self.state.lock();
            if st.ready == state {
                return;
            }
            st.ready = state;
            match state {
                ReadyState::Loading => st.markers.insert(Markers::LAYOUT | Markers::LOADING),
                ReadyState::Complete => {
                    st.markers.insert(Markers::LAYOUT);
                    st.markers.remove(Markers::LOADING);
                }
                ReadyState::Error => st.markers.remove(Markers::LOADING),
                _ => {}
            }
        }
        tracing::debug!(element = %self.id(), tag = %self.tag(), state = %state, "ready state changed");
        self.publish(self.event(EventKind::ReadyStateChanged).with_ready_state(state));

        match state {
            ReadyState::Loading => {
                if new_path {
                    self.signals.signal(Signal::LoadStart);
                    self.signals.reset(Signal::Unload);
                    self.signals.reset(Signal::LoadEnd);
                }
                self.publish(self.event(EventKind::LoadStart));
            }
            ReadyState::Complete => {
                if new_path {
                    self.signals.signal(Signal::LoadStart);
                    self.signals.signal(Signal::LoadEnd);
                    self.signals.signal(Signal::IniLoad);
                    self.signals.reset(Signal::Unload);
                }
                self.publish(self.event(EventKind::LoadEnd));
            }
            ReadyState::Error => {
                let err = failure.cloned().unwrap_or_else(|| ElementError::fail("error"));
                if new_path {
                    self.signals.reject(Signal::LoadEnd, err.clone());
                }
                self.publish(self.event(EventKind::Error).with_error(&err));
            }
            _ => {}
        }
    }

    // === Visual hooks ===

    /// The behavior started rendering content.
    pub fn render_started(&self) {
        self.signals.signal(Signal::RenderStart);
        self.state.lock().markers.remove(Markers::LOADING);
    }

    /// Records a size applied by the behavior.
    pub fn apply_size(&self, size: Size) {
        self.state.lock().size = Some(size);
        self.publish(self.event(EventKind::SizeChanged).with_size(size));
    }

    // === Checkpoints ===

    /// Read-only access to the checkpoint bus.
    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Resolves once built; rejects with the build failure.
    pub async fn when_built(&self) -> Result<(), ElementError> {
        self.signals.when(Signal::Built).await
    }

    pub async fn when_mounted(&self) -> Result<(), ElementError> {
        self.signals.when(Signal::Mounted).await
    }

    /// Resolves at the end of the current load; rejects when it failed.
    pub async fn when_loaded(&self) -> Result<(), ElementError> {
        self.signals.when(Signal::LoadEnd).await
    }

    // === Accessors ===

    #[inline]
    pub fn id(&self) -> ElementId {
        self.info.id
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.info.tag
    }

    #[inline]
    pub fn info(&self) -> &ElementInfo {
        &self.info
    }

    #[inline]
    pub fn attributes(&self) -> &ElementAttributes {
        &self.attrs
    }

    /// Active behavior, once resolution started.
    pub fn behavior(&self) -> Option<BehaviorRef> {
        self.state.lock().behavior.clone()
    }

    /// True when build and mount are driven by the scheduler.
    pub fn is_new_path(&self) -> bool {
        self.behavior().is_some_and(|b| b.is_new_execution_path())
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.lock().ready
    }

    pub fn upgrade_state(&self) -> UpgradeState {
        self.state.lock().upgrade
    }

    pub fn is_built(&self) -> bool {
        self.state.lock().built
    }

    pub fn is_mounted(&self) -> bool {
        self.state.lock().mounted
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn markers(&self) -> Markers {
        self.state.lock().markers
    }

    /// Completed (or failed) layout passes since the last reset.
    pub fn layout_count(&self) -> u32 {
        self.state.lock().layout_count
    }

    /// Time between resolution start and completion.
    pub fn upgrade_delay(&self) -> Option<Duration> {
        self.state.lock().upgrade_delay
    }

    pub fn size(&self) -> Option<Size> {
        self.state.lock().size
    }

    /// Resource-table index (legacy path, while attached).
    pub fn resource_id(&self) -> Option<ResourceId> {
        self.state.lock().resource
    }

    /// Visibility as known by the resource manager.
    pub fn is_displayed(&self) -> bool {
        self.resource_id()
            .is_some_and(|id| self.services.resources.is_displayed(id))
    }

    // === Plumbing ===

    pub(super) fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_element(self.info.id, Arc::clone(&self.info.tag))
    }

    #[inline]
    pub(super) fn publish(&self, event: Event) {
        self.services.publish(event);
    }

    /// Forwards a failure to the reporter unless it is expected control flow.
    pub(super) fn report(&self, err: &ElementError) {
        if err.is_reportable() {
            self.services.reporter.report(err, &self.info);
        }
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.info.id)
            .field("tag", &self.info.tag)
            .finish_non_exhaustive()
    }
}
