// ── Dashboard facade ──
//
// Wires the bootstrapper and the subscriber together. All state changes
// (session updates, listener deliveries, sign-in notices) are funnelled
// into one reconciliation task, which owns the subscriber and publishes
// a `DashboardView` after each step.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::bootstrap::IdentityBootstrapper;
use crate::config::DashboardConfig;
use crate::error::{CoreError, FailureKind};
use crate::model::{ExpenseSummary, Session, Snapshot};
use crate::path::CollectionPath;
use crate::provider::Backend;
use crate::subscriber::{LiveCollectionSubscriber, SubscriberEvent, SubscriberUpdate};

// ── Phase ────────────────────────────────────────────────────────────

/// Combined lifecycle state.
///
/// `Idle -> Authenticating -> Ready <-> Subscribed`. `Failed` is terminal,
/// except that a subscription failure ends when a new key attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Authenticating,
    Ready,
    Subscribed,
    Failed(FailureKind),
}

impl Phase {
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Authenticating => f.write_str("authenticating"),
            Self::Ready => f.write_str("ready"),
            Self::Subscribed => f.write_str("subscribed"),
            Self::Failed(kind) => write!(f, "failed ({kind})"),
        }
    }
}

// ── DashboardView ───────────────────────────────────────────────────

/// Everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub phase: Phase,
    pub session: Session,
    pub snapshot: Snapshot,
    /// True until the session is ready or a terminal failure occurs.
    pub loading: bool,
    /// Terminal failure message.
    pub error: Option<String>,
    /// Non-fatal message, e.g. a failed sign-in attempt.
    pub notice: Option<String>,
    pub collection_path: Option<CollectionPath>,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            session: Session::default(),
            snapshot: Snapshot::default(),
            loading: true,
            error: None,
            notice: None,
            collection_path: None,
        }
    }
}

impl DashboardView {
    pub fn summary(&self) -> ExpenseSummary {
        ExpenseSummary::from(&self.snapshot)
    }

    fn fail(&mut self, err: &CoreError) {
        if let Some(kind) = err.kind() {
            self.phase = Phase::Failed(kind);
        }
        self.loading = false;
        self.error = Some(err.to_string());
    }

    fn apply_session(&mut self, session: Session) {
        if session.is_ready() {
            self.loading = false;
            if self.phase == Phase::Authenticating {
                self.phase = Phase::Ready;
            }
            if !session.subject_id().is_anonymous() {
                self.notice = None;
            }
        }
        self.session = session;
    }

    fn apply_update(&mut self, update: SubscriberUpdate) {
        match update {
            // A subscription failure is never re-attached under the same
            // key, so a fresh attach means a new key and the failure is over.
            SubscriberUpdate::Attached
                if self.phase == Phase::Failed(FailureKind::Subscription) =>
            {
                info!("subscription recovered on new activation key");
                self.phase = Phase::Subscribed;
                self.error = None;
            }
            SubscriberUpdate::Attached if !self.phase.is_failed() => {
                self.phase = Phase::Subscribed;
            }
            SubscriberUpdate::Detached if !self.phase.is_failed() => {
                self.phase = if self.session.is_ready() {
                    Phase::Ready
                } else {
                    Phase::Authenticating
                };
            }
            SubscriberUpdate::Attached | SubscriberUpdate::Detached => {}
            SubscriberUpdate::Snapshot(snapshot) => self.snapshot = snapshot,
            SubscriberUpdate::Failed(err) => self.fail(&err),
        }
    }
}

// ── Dashboard ────────────────────────────────────────────────────────

/// Entry point for the presentation layer.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Call [`start`] once, then
/// watch [`view`].
///
/// [`start`]: Self::start
/// [`view`]: Self::view
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    backend: Arc<dyn Backend>,
    config: DashboardConfig,
    view: Arc<watch::Sender<DashboardView>>,
    cancel: CancellationToken,
    started: AtomicBool,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for DashboardInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Dashboard {
    /// Create a dashboard. Does NOT start it.
    pub fn new(backend: Arc<dyn Backend>, config: DashboardConfig) -> Self {
        let (view, _) = watch::channel(DashboardView::default());
        Self {
            inner: Arc::new(DashboardInner {
                backend,
                config,
                view: Arc::new(view),
                cancel: CancellationToken::new(),
                started: AtomicBool::new(false),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Subscribe to view changes.
    pub fn view(&self) -> watch::Receiver<DashboardView> {
        self.inner.view.subscribe()
    }

    pub fn current_view(&self) -> DashboardView {
        self.inner.view.borrow().clone()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Validate configuration, bootstrap identity, and spawn the
    /// reconciliation task.
    ///
    /// Terminal failures are both returned and published in the view.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return Err(CoreError::Internal("dashboard already started".into()));
        }

        let config = &self.inner.config;
        let path = config.collection_path().inspect_err(|e| self.fail(e))?;
        info!(path = %path, "starting dashboard");

        self.inner.view.send_modify(|v| {
            v.phase = Phase::Authenticating;
            v.collection_path = Some(path.clone());
        });

        let mut bootstrapper = IdentityBootstrapper::start(self.inner.backend.as_ref(), config)
            .await
            .inspect_err(|e| self.fail(e))?;

        let notices = bootstrapper
            .take_notices()
            .unwrap_or_else(|| mpsc::unbounded_channel().1);
        let (mut subscriber, events) = LiveCollectionSubscriber::new(path);
        subscriber.set_store(Some(bootstrapper.store()));

        let task = ReconcileTask {
            session: bootstrapper.session(),
            bootstrapper,
            subscriber,
            events,
            notices,
            view: Arc::clone(&self.inner.view),
        };
        let cancel = self.inner.cancel.child_token();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(task.run(cancel)));
        debug!("reconcile task spawned");
        Ok(())
    }

    /// Stop the reconciliation task, detaching every listener, and wait
    /// for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("dashboard shut down");
    }

    fn fail(&self, err: &CoreError) {
        error!(error = %err, "dashboard failed");
        self.inner.view.send_modify(|v| v.fail(err));
    }
}

// ── Reconciliation task ─────────────────────────────────────────────

struct ReconcileTask {
    bootstrapper: IdentityBootstrapper,
    session: watch::Receiver<Session>,
    subscriber: LiveCollectionSubscriber,
    events: mpsc::UnboundedReceiver<SubscriberEvent>,
    notices: mpsc::UnboundedReceiver<String>,
    view: Arc<watch::Sender<DashboardView>>,
}

impl ReconcileTask {
    async fn run(mut self, cancel: CancellationToken) {
        // The listener may have fired before this task was scheduled.
        let initial = self.session.borrow_and_update().clone();
        self.on_session(initial);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = self.session.changed() => {
                    if changed.is_err() {
                        debug!("session channel closed");
                        break;
                    }
                    let session = self.session.borrow_and_update().clone();
                    self.on_session(session);
                }
                Some(event) = self.events.recv() => {
                    if let Some(update) = self.subscriber.apply(event) {
                        self.view.send_modify(|v| v.apply_update(update));
                    }
                }
                Some(notice) = self.notices.recv() => {
                    self.view.send_modify(|v| v.notice = Some(notice));
                }
            }
        }

        self.subscriber.detach();
        self.bootstrapper.deregister();
        debug!("reconcile task exiting");
    }

    fn on_session(&mut self, session: Session) {
        let update = self.subscriber.reconcile(&session);
        self.view.send_modify(|v| {
            v.apply_session(session);
            if let Some(update) = update {
                v.apply_update(update);
            }
        });
    }
}
