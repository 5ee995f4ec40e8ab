//! Test doubles: scripted behaviors and recording collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::behaviors::{Behavior, BehaviorClass, BehaviorRef, MountOutcome, Upgrade};
use crate::collaborators::{
    ConsentPolicy, ConsentRequest, ErrorReporter, QueueScheduler, ResourceTable, Scheduler,
};
use crate::core::{ActionInvocation, Element, ElementId, ElementInfo, Host, HostConfig};
use crate::error::ElementError;

/// Routes `tracing` output to the test harness (`RUST_LOG` filters it).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Lets spawned pipelines make progress on the current-thread runtime.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// One-shot gate that stays open once opened.
#[derive(Clone)]
pub struct Latch {
    tx: watch::Sender<bool>,
}

impl Latch {
    fn new(open: bool) -> Self {
        Self {
            tx: watch::Sender::new(open),
        }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + use<> {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.wait_for(|open| *open).await;
        }
    }
}

/// Hook invocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub build: usize,
    pub mount: usize,
    pub unmount: usize,
    pub layout: usize,
    pub unlayout: usize,
    pub pause: usize,
    pub resume: usize,
    pub attached: usize,
    pub detached: usize,
    pub first_layout: usize,
    pub preconnect: usize,
}

#[derive(Default)]
struct Script {
    new_path: bool,
    loading_mount: bool,
    deferred_upgrade: bool,
    relayout_on_unlayout: bool,
    unlayout_on_pause: bool,
    placeholder: bool,
    fail_upgrade: Option<ElementError>,
    fail_build: Option<ElementError>,
    fail_mount: Option<ElementError>,
    fail_layout: Option<ElementError>,
    fail_action: Option<String>,
    replacement: Option<ScriptedBehavior>,
}

struct Inner {
    script: Mutex<Script>,
    counts: Mutex<Counts>,
    actions: Mutex<Vec<(String, bool)>>,
    build_gate: Latch,
    upgrade_gate: Latch,
    loading: Latch,
}

/// Behavior whose hooks follow a script and count their invocations.
///
/// Every element constructed from [`ScriptedBehavior::class`] shares the same
/// script, counters and gates.
#[derive(Clone)]
pub struct ScriptedBehavior {
    inner: Arc<Inner>,
}

impl ScriptedBehavior {
    fn with_path(new_path: bool) -> Self {
        let script = Script {
            new_path,
            ..Script::default()
        };
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(script),
                counts: Mutex::new(Counts::default()),
                actions: Mutex::new(Vec::new()),
                build_gate: Latch::new(true),
                upgrade_gate: Latch::new(true),
                loading: Latch::new(false),
            }),
        }
    }

    pub fn legacy() -> Self {
        Self::with_path(false)
    }

    pub fn new_path() -> Self {
        Self::with_path(true)
    }

    pub fn class(&self, name: &str) -> BehaviorClass {
        let me = self.clone();
        BehaviorClass::new(name, move |_info: &ElementInfo| Arc::new(me.clone()) as BehaviorRef)
    }

    fn script(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.inner.script.lock());
        self
    }

    /// Build hook waits for [`ScriptedBehavior::open_build`].
    pub fn gated_build(self) -> Self {
        self.inner.build_gate.tx.send_replace(false);
        self
    }

    /// Mount hook returns a loading future settled by [`ScriptedBehavior::finish_loading`].
    pub fn loading_mount(self) -> Self {
        self.script(|s| s.loading_mount = true)
    }

    pub fn deferred_upgrade(self) -> Self {
        self.script(|s| s.deferred_upgrade = true)
    }

    /// Deferred upgrade that waits for [`ScriptedBehavior::open_upgrade`].
    pub fn gated_upgrade(self) -> Self {
        self.inner.upgrade_gate.tx.send_replace(false);
        self.deferred_upgrade()
    }

    /// Upgrade hands over to `other` (deferred if combined with
    /// [`ScriptedBehavior::deferred_upgrade`]).
    pub fn replaced_by(self, other: &ScriptedBehavior) -> Self {
        let other = other.clone();
        self.script(|s| s.replacement = Some(other))
    }

    pub fn fail_upgrade(self, err: ElementError) -> Self {
        self.script(|s| s.fail_upgrade = Some(err))
    }

    pub fn fail_build(self, err: ElementError) -> Self {
        self.script(|s| s.fail_build = Some(err))
    }

    pub fn fail_mount(self, err: ElementError) -> Self {
        self.script(|s| s.fail_mount = Some(err))
    }

    pub fn fail_layout(self, err: ElementError) -> Self {
        self.script(|s| s.fail_layout = Some(err))
    }

    pub fn fail_action(self, method: &str) -> Self {
        let method = method.to_string();
        self.script(|s| s.fail_action = Some(method))
    }

    pub fn relayout_on_unlayout(self) -> Self {
        self.script(|s| s.relayout_on_unlayout = true)
    }

    pub fn unlayout_on_pause(self) -> Self {
        self.script(|s| s.unlayout_on_pause = true)
    }

    pub fn with_placeholder(self) -> Self {
        self.script(|s| s.placeholder = true)
    }

    pub fn open_build(&self) {
        self.inner.build_gate.open();
    }

    pub fn open_upgrade(&self) {
        self.inner.upgrade_gate.open();
    }

    pub fn finish_loading(&self) {
        self.inner.loading.open();
    }

    /// Layout succeeds from now on.
    pub fn heal_layout(&self) {
        self.inner.script.lock().fail_layout = None;
    }

    pub fn counts(&self) -> Counts {
        *self.inner.counts.lock()
    }

    /// Executed actions as `(method, deferred)`.
    pub fn actions(&self) -> Vec<(String, bool)> {
        self.inner.actions.lock().clone()
    }

    fn bump(&self, f: impl FnOnce(&mut Counts)) {
        f(&mut self.inner.counts.lock());
    }
}

#[async_trait]
impl Behavior for ScriptedBehavior {
    fn upgrade(&self) -> Upgrade {
        let (deferred, failure, replacement) = {
            let s = self.inner.script.lock();
            (s.deferred_upgrade, s.fail_upgrade.clone(), s.replacement.clone())
        };
        let replacement = replacement.map(|r| Arc::new(r) as BehaviorRef);
        match (failure, deferred, replacement) {
            (Some(err), _, _) => Upgrade::Deferred(
                async move {
                    tokio::task::yield_now().await;
                    Err::<Option<BehaviorRef>, _>(err)
                }
                .boxed(),
            ),
            (None, true, replacement) => {
                let opened = self.inner.upgrade_gate.wait();
                Upgrade::Deferred(
                    async move {
                        opened.await;
                        tokio::task::yield_now().await;
                        Ok::<_, ElementError>(replacement)
                    }
                    .boxed(),
                )
            }
            (None, false, Some(replacement)) => Upgrade::Replace(replacement),
            (None, false, None) => Upgrade::Ready,
        }
    }

    async fn build(&self) -> Result<(), ElementError> {
        self.bump(|c| c.build += 1);
        self.inner.build_gate.wait().await;
        match self.inner.script.lock().fail_build.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn mount(&self, _token: CancellationToken) -> Result<MountOutcome, ElementError> {
        self.bump(|c| c.mount += 1);
        let s = self.inner.script.lock();
        if let Some(err) = s.fail_mount.clone() {
            return Err(err);
        }
        if s.loading_mount {
            let loaded = self.inner.loading.wait();
            return Ok(MountOutcome::Loading(
                async move {
                    loaded.await;
                    Ok::<_, ElementError>(())
                }
                .boxed(),
            ));
        }
        Ok(MountOutcome::Mounted)
    }

    fn unmount(&self) {
        self.bump(|c| c.unmount += 1);
    }

    async fn layout(&self) -> Result<(), ElementError> {
        self.bump(|c| c.layout += 1);
        tokio::task::yield_now().await;
        match self.inner.script.lock().fail_layout.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn unlayout(&self) -> bool {
        self.bump(|c| c.unlayout += 1);
        self.inner.script.lock().relayout_on_unlayout
    }

    fn unlayout_on_pause(&self) -> bool {
        self.inner.script.lock().unlayout_on_pause
    }

    fn pause(&self) {
        self.bump(|c| c.pause += 1);
    }

    fn resume(&self) {
        self.bump(|c| c.resume += 1);
    }

    fn attached(&self) {
        self.bump(|c| c.attached += 1);
    }

    fn detached(&self) {
        self.bump(|c| c.detached += 1);
    }

    fn first_layout_completed(&self) {
        self.bump(|c| c.first_layout += 1);
    }

    fn uses_loading(&self) -> bool {
        self.inner.script.lock().loading_mount
    }

    fn is_new_execution_path(&self) -> bool {
        self.inner.script.lock().new_path
    }

    fn preconnect(&self, _on_layout: bool) {
        self.bump(|c| c.preconnect += 1);
    }

    fn create_placeholder(&self) -> bool {
        self.inner.script.lock().placeholder
    }

    fn execute_action(
        &self,
        invocation: &ActionInvocation,
        deferred: bool,
    ) -> Result<(), ElementError> {
        self.inner
            .actions
            .lock()
            .push((invocation.method.to_string(), deferred));
        let failing = self.inner.script.lock().fail_action.clone();
        match failing {
            Some(m) if m == *invocation.method => Err(ElementError::fail(format!("{m} rejected"))),
            _ => Ok(()),
        }
    }
}

/// Scheduler that only records requests; tests drive `Element::mount` directly.
#[derive(Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<ElementId>>,
    asap: Mutex<Vec<ElementId>>,
    unscheduled: Mutex<Vec<ElementId>>,
}

impl RecordingScheduler {
    pub fn scheduled(&self) -> Vec<ElementId> {
        self.scheduled.lock().clone()
    }

    pub fn scheduled_asap(&self) -> Vec<ElementId> {
        self.asap.lock().clone()
    }

    pub fn unscheduled(&self) -> Vec<ElementId> {
        self.unscheduled.lock().clone()
    }
}

impl Scheduler for RecordingScheduler {
    fn schedule(&self, element: &Arc<Element>) {
        self.scheduled.lock().push(element.id());
    }

    fn schedule_asap(&self, element: &Arc<Element>) {
        self.asap.lock().push(element.id());
    }

    fn unschedule(&self, element: &Element) {
        self.unscheduled.lock().push(element.id());
    }

    fn set_container(&self, _element: &Element, _scroll_anchor: Option<ElementId>) {}

    fn remove_container(&self, _element: &Element) {}
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(ElementId, ElementError)>>,
}

impl RecordingReporter {
    pub fn count(&self) -> usize {
        self.reports.lock().len()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &ElementError, element: &ElementInfo) {
        self.reports.lock().push((element.id, error.clone()));
    }
}

/// Consent policy answering every request the same way.
pub struct ScriptedConsent {
    allow: bool,
    requests: Mutex<Vec<ConsentRequest>>,
}

impl ScriptedConsent {
    pub fn allow() -> Arc<Self> {
        Arc::new(Self {
            allow: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn deny() -> Arc<Self> {
        Arc::new(Self {
            allow: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ConsentRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ConsentPolicy for ScriptedConsent {
    async fn evaluate(&self, request: &ConsentRequest) -> bool {
        self.requests.lock().push(request.clone());
        tokio::task::yield_now().await;
        self.allow
    }
}

/// Host wired with recording collaborators.
pub struct TestHost {
    pub host: Arc<Host>,
    pub scheduler: Arc<RecordingScheduler>,
    pub reporter: Arc<RecordingReporter>,
    /// Set by [`TestHost::with_queue_scheduler`].
    pub queue: Option<Arc<QueueScheduler>>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::assemble(HostConfig::default(), ResourceTable::new(), None, false)
    }

    pub fn with_resources(resources: Arc<ResourceTable>) -> Self {
        Self::assemble(HostConfig::default(), resources, None, false)
    }

    pub fn with_consent(consent: Arc<ScriptedConsent>) -> Self {
        Self::assemble(HostConfig::default(), ResourceTable::new(), Some(consent), false)
    }

    pub fn with_queue_scheduler(cfg: HostConfig) -> Self {
        Self::assemble(cfg, ResourceTable::new(), None, true)
    }

    fn assemble(
        cfg: HostConfig,
        resources: Arc<ResourceTable>,
        consent: Option<Arc<ScriptedConsent>>,
        queue: bool,
    ) -> Self {
        init_tracing();
        let scheduler = Arc::new(RecordingScheduler::default());
        let reporter = Arc::new(RecordingReporter::default());

        let queue = queue.then(|| {
            QueueScheduler::spawn(
                cfg.scheduler_queue_capacity,
                cfg.mount_limit(),
                CancellationToken::new(),
            )
        });
        let active: Arc<dyn Scheduler> = match &queue {
            Some(q) => q.clone(),
            None => scheduler.clone(),
        };

        let mut builder = Host::builder(cfg)
            .with_scheduler(active)
            .with_resources(resources.clone())
            .with_reporter(reporter.clone());
        if let Some(consent) = consent {
            builder = builder.with_consent(consent);
        }

        Self {
            host: builder.build(),
            scheduler,
            reporter,
            queue,
        }
    }
}
