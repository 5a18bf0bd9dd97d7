// ── In-memory provider for lifecycle tests ──
//
// Records every provider call in order. Auth state and collection
// deliveries are pushed by the test; nothing happens on its own.

#![allow(clippy::unwrap_used)]

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{UnboundedReceiverStream, WatchStream};

use crate::config::{DashboardConfig, ProviderConfig};
use crate::error::CoreError;
use crate::model::{AuthUser, Document};
use crate::path::CollectionPath;
use crate::provider::{
    AuthStateStream, Backend, DocumentStore, IdentityProvider, ProviderApp, SnapshotStream,
    StoreId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Initialize { project_id: String },
    OnAuthStateChanged,
    SignInWithToken(String),
    SignInAnonymously,
    OnSnapshot(String),
}

pub(crate) type CallLog = Arc<Mutex<Vec<Call>>>;

fn record(log: &CallLog, call: Call) {
    log.lock().unwrap().push(call);
}

// ── Backend ─────────────────────────────────────────────────────────

pub(crate) struct FakeBackend {
    pub calls: CallLog,
    pub auth: Arc<FakeAuth>,
    pub store: Arc<FakeStore>,
    fail_initialize: Option<CoreError>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let calls: CallLog = Arc::default();
        Self {
            auth: Arc::new(FakeAuth::new(calls.clone())),
            store: Arc::new(FakeStore::new(calls.clone())),
            calls,
            fail_initialize: None,
        }
    }

    pub fn failing(error: CoreError) -> Self {
        Self {
            fail_initialize: Some(error),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn initialize(&self, config: &ProviderConfig) -> Result<ProviderApp, CoreError> {
        record(
            &self.calls,
            Call::Initialize {
                project_id: config.project_id.clone(),
            },
        );
        if let Some(err) = &self.fail_initialize {
            return Err(err.clone());
        }
        Ok(ProviderApp {
            auth: self.auth.clone(),
            store: self.store.clone(),
        })
    }
}

// ── Identity ────────────────────────────────────────────────────────

pub(crate) struct FakeAuth {
    calls: CallLog,
    state: watch::Sender<Option<AuthUser>>,
    sign_in_error: Mutex<Option<CoreError>>,
}

impl FakeAuth {
    fn new(calls: CallLog) -> Self {
        Self {
            calls,
            state: watch::channel(None).0,
            sign_in_error: Mutex::new(None),
        }
    }

    /// Fire an auth-state event.
    pub fn emit(&self, user: Option<AuthUser>) {
        self.state.send_replace(user);
    }

    pub fn fail_sign_in(&self, error: CoreError) {
        *self.sign_in_error.lock().unwrap() = Some(error);
    }

    fn sign_in_result(&self, uid: &str, anonymous: bool) -> Result<AuthUser, CoreError> {
        match self.sign_in_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(AuthUser::new(uid, anonymous)),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeAuth {
    fn on_auth_state_changed(&self) -> AuthStateStream {
        record(&self.calls, Call::OnAuthStateChanged);
        WatchStream::new(self.state.subscribe()).boxed()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    async fn sign_in_with_token(&self, token: &SecretString) -> Result<AuthUser, CoreError> {
        record(
            &self.calls,
            Call::SignInWithToken(token.expose_secret().to_owned()),
        );
        self.sign_in_result("token-user", false)
    }

    async fn sign_in_anonymously(&self) -> Result<AuthUser, CoreError> {
        record(&self.calls, Call::SignInAnonymously);
        self.sign_in_result("anon-user", true)
    }
}

// ── Document store ──────────────────────────────────────────────────

type Delivery = Result<Vec<Document>, CoreError>;

pub(crate) struct FakeStore {
    id: StoreId,
    calls: CallLog,
    senders: Mutex<Vec<mpsc::UnboundedSender<Delivery>>>,
    detached: Arc<AtomicUsize>,
}

impl FakeStore {
    pub fn new(calls: CallLog) -> Self {
        Self {
            id: StoreId::next(),
            calls,
            senders: Mutex::new(Vec::new()),
            detached: Arc::default(),
        }
    }

    /// Deliver a full collection to the most recent listener.
    /// Returns `false` if that listener is gone.
    pub fn push(&self, docs: Vec<Document>) -> bool {
        self.send(Ok(docs))
    }

    pub fn fail(&self, error: CoreError) -> bool {
        self.send(Err(error))
    }

    fn send(&self, delivery: Delivery) -> bool {
        self.senders
            .lock()
            .unwrap()
            .last()
            .is_some_and(|tx| tx.send(delivery).is_ok())
    }

    /// How many listener streams have been dropped.
    pub fn detached(&self) -> usize {
        self.detached.load(Ordering::SeqCst)
    }

    pub fn attached(&self) -> usize {
        self.senders.lock().unwrap().len()
    }
}

impl DocumentStore for FakeStore {
    fn id(&self) -> StoreId {
        self.id
    }

    fn on_snapshot(&self, path: &CollectionPath) -> SnapshotStream {
        record(&self.calls, Call::OnSnapshot(path.to_string()));
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        DetachCounting {
            inner: UnboundedReceiverStream::new(rx),
            detached: self.detached.clone(),
        }
        .boxed()
    }
}

/// Counts drops so tests can see exactly when a listener was released.
struct DetachCounting {
    inner: UnboundedReceiverStream<Delivery>,
    detached: Arc<AtomicUsize>,
}

impl Stream for DetachCounting {
    type Item = Delivery;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for DetachCounting {
    fn drop(&mut self) {
        self.detached.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub(crate) fn valid_config() -> DashboardConfig {
    DashboardConfig {
        application_id: "test-app".into(),
        ..DashboardConfig::with_provider(ProviderConfig::new("test-key", "demo"))
    }
}

pub(crate) fn doc(id: &str) -> Document {
    let mut fields = Map::new();
    fields.insert("amount".into(), json!(100.0));
    fields.insert("category".into(), Value::String(format!("item {id}")));
    Document::new(id, fields)
}

pub(crate) fn docs(ids: &[&str]) -> Vec<Document> {
    ids.iter().map(|id| doc(id)).collect()
}

/// Poll `cond` until it holds, failing the test after one second.
pub(crate) async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

/// Give spawned tasks a chance to run.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
