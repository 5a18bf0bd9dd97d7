// ── Live collection subscriber ──
//
// Keeps at most one collection listener attached, keyed by the
// activation key (readiness, store identity, subject, path). Deliveries
// arrive on a channel tagged with the attachment's generation; anything
// from an older generation is dropped.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace};

use crate::error::CoreError;
use crate::listener::{ListenerHandle, spawn_listener};
use crate::model::{Document, Record, Session, Snapshot, SubjectId};
use crate::path::CollectionPath;
use crate::provider::{DocumentStore, StoreId};

// ── ActivationKey ───────────────────────────────────────────────────

/// Conditions an attached listener was opened under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationKey {
    pub is_ready: bool,
    pub store: Option<StoreId>,
    pub subject: SubjectId,
    pub path: CollectionPath,
}

impl ActivationKey {
    pub fn new(session: &Session, store: Option<StoreId>, path: &CollectionPath) -> Self {
        Self {
            is_ready: session.is_ready(),
            store,
            subject: session.subject_id().clone(),
            path: path.clone(),
        }
    }

    /// All preconditions for attaching hold.
    pub fn is_satisfied(&self) -> bool {
        self.is_ready && self.store.is_some() && !self.subject.is_empty()
    }
}

// ── Events ──────────────────────────────────────────────────────────

/// A raw delivery from a listener task, to be passed to
/// [`LiveCollectionSubscriber::apply`].
#[derive(Debug)]
pub struct SubscriberEvent {
    generation: u64,
    delivery: Result<Vec<Document>, CoreError>,
}

/// What changed as a result of `reconcile` or `apply`.
#[derive(Debug, Clone)]
pub enum SubscriberUpdate {
    Attached,
    Detached,
    Snapshot(Snapshot),
    /// The listener failed and was detached. Carries a
    /// [`CoreError::Subscription`].
    Failed(CoreError),
}

struct Attachment {
    key: ActivationKey,
    generation: u64,
    handle: ListenerHandle,
}

// ── Subscriber ──────────────────────────────────────────────────────

/// Owns the collection listener and the published `Snapshot`.
pub struct LiveCollectionSubscriber {
    path: CollectionPath,
    store: Option<Arc<dyn DocumentStore>>,
    current: Option<Attachment>,
    generation: u64,
    /// Key whose listener failed; never re-attached automatically.
    failed: Option<ActivationKey>,
    events: mpsc::UnboundedSender<SubscriberEvent>,
    snapshot: watch::Sender<Snapshot>,
}

impl LiveCollectionSubscriber {
    /// Create a detached subscriber. Listener deliveries arrive on the
    /// returned receiver and must be fed back through [`apply`].
    ///
    /// [`apply`]: Self::apply
    pub fn new(path: CollectionPath) -> (Self, mpsc::UnboundedReceiver<SubscriberEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(Snapshot::default());
        let subscriber = Self {
            path,
            store: None,
            current: None,
            generation: 0,
            failed: None,
            events,
            snapshot,
        };
        (subscriber, events_rx)
    }

    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// Replace the store handle. Takes effect on the next `reconcile`.
    pub fn set_store(&mut self, store: Option<Arc<dyn DocumentStore>>) {
        self.store = store;
    }

    pub fn is_attached(&self) -> bool {
        self.current.is_some()
    }

    /// Whether a listener on the current key has failed.
    pub fn has_failed(&self) -> bool {
        self.failed.is_some()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    fn key_for(&self, session: &Session) -> ActivationKey {
        ActivationKey::new(session, self.store.as_ref().map(|s| s.id()), &self.path)
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Bring the attachment in line with `session` and the store handle.
    ///
    /// An unchanged key is a no-op. Otherwise the old listener is
    /// cancelled first, then a new one attached if every precondition
    /// holds and that key has not already failed.
    pub fn reconcile(&mut self, session: &Session) -> Option<SubscriberUpdate> {
        let key = self.key_for(session);
        if self.current.as_ref().is_some_and(|a| a.key == key) {
            return None;
        }

        let detached = self.detach();

        if !key.is_satisfied() {
            trace!(?key, "activation preconditions not met");
            return detached.then_some(SubscriberUpdate::Detached);
        }
        if self.failed.as_ref() == Some(&key) {
            debug!(path = %self.path, "listener failed for this key, not re-attaching");
            return detached.then_some(SubscriberUpdate::Detached);
        }

        if self.attach(session) {
            Some(SubscriberUpdate::Attached)
        } else {
            detached.then_some(SubscriberUpdate::Detached)
        }
    }

    /// Open the collection listener.
    ///
    /// A no-op returning `false` unless the session is ready, has a
    /// subject, and a store handle is set. Any existing listener is
    /// cancelled before the new one is opened.
    pub fn attach(&mut self, session: &Session) -> bool {
        let key = self.key_for(session);
        if !key.is_satisfied() {
            debug!(ready = key.is_ready, "attach skipped, preconditions not met");
            return false;
        }
        let Some(store) = self.store.clone() else {
            return false;
        };

        self.detach();
        self.generation += 1;
        let generation = self.generation;

        let events = self.events.clone();
        let handle = spawn_listener("collection", store.on_snapshot(&self.path), move |delivery| {
            let last = delivery.is_err();
            if events
                .send(SubscriberEvent {
                    generation,
                    delivery,
                })
                .is_err()
                || last
            {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        });

        info!(path = %self.path, subject = %key.subject, generation, "collection listener attached");
        self.current = Some(Attachment {
            key,
            generation,
            handle,
        });
        true
    }

    /// Cancel the current listener, if any. Returns `true` if one was
    /// attached.
    pub fn detach(&mut self) -> bool {
        let Some(attachment) = self.current.take() else {
            return false;
        };
        attachment.handle.cancel();
        info!(path = %self.path, generation = attachment.generation, "collection listener detached");
        true
    }

    /// Apply one listener delivery.
    ///
    /// Deliveries from a cancelled or superseded listener are dropped.
    /// A snapshot replaces the previous one wholesale; an error detaches
    /// the listener and keeps the last good snapshot.
    pub fn apply(&mut self, event: SubscriberEvent) -> Option<SubscriberUpdate> {
        let current = self.current.as_ref()?;
        if event.generation != current.generation || current.handle.is_cancelled() {
            trace!(generation = event.generation, "stale delivery dropped");
            return None;
        }

        match event.delivery {
            Ok(documents) => {
                let snapshot = Snapshot::from_records(documents.into_iter().map(Record::from));
                debug!(path = %self.path, count = snapshot.len(), "snapshot delivered");
                self.snapshot.send_replace(snapshot.clone());
                Some(SubscriberUpdate::Snapshot(snapshot))
            }
            Err(e) => {
                let err = e.into_subscription();
                error!(path = %self.path, error = %err, "collection listener failed");
                let key = current.key.clone();
                self.detach();
                self.failed = Some(key);
                Some(SubscriberUpdate::Failed(err))
            }
        }
    }
}
