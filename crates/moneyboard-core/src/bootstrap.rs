// ── Identity bootstrapper ──
//
// Initializes the provider, then keeps one persistent auth-state
// listener. Each event with no signed-in user kicks off a sign-in
// (custom token when configured, otherwise anonymous) without waiting
// for it; the listener, not the sign-in call, drives the session.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::SecretString;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::listener::{ListenerHandle, spawn_listener};
use crate::model::{AuthUser, Session};
use crate::provider::{Backend, DocumentStore, IdentityProvider};

/// Owns the `Session` and the auth-state listener.
pub struct IdentityBootstrapper {
    session: Arc<watch::Sender<Session>>,
    store: Arc<dyn DocumentStore>,
    listener: ListenerHandle,
    sign_ins: CancellationToken,
    notices: Option<mpsc::UnboundedReceiver<String>>,
}

impl IdentityBootstrapper {
    /// Validate `config`, initialize the provider, and register the
    /// auth-state listener.
    ///
    /// Configuration is checked before the backend is touched. A backend
    /// failure is reported as [`CoreError::Initialization`].
    pub async fn start(backend: &dyn Backend, config: &DashboardConfig) -> Result<Self, CoreError> {
        let provider = config.validate().inspect_err(|e| {
            error!(error = %e, "invalid provider configuration");
        })?;

        let app = backend.initialize(provider).await.map_err(|e| {
            let e = e.into_initialization();
            error!(error = %e, "provider initialization failed");
            e
        })?;
        debug!(project = %provider.project_id, store = %app.store.id(), "provider initialized");

        let (session_tx, _) = watch::channel(Session::new());
        let session = Arc::new(session_tx);
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let sign_ins = CancellationToken::new();

        let sign_in = SignIn {
            auth: Arc::clone(&app.auth),
            token: config.auth_token().cloned(),
            in_flight: Arc::new(AtomicBool::new(false)),
            cancel: sign_ins.clone(),
            notices: notice_tx,
        };

        let listener = spawn_listener("auth-state", app.auth.on_auth_state_changed(), {
            let session = Arc::clone(&session);
            move |user: Option<AuthUser>| {
                if user.is_none() {
                    sign_in.begin();
                }
                if session.send_if_modified(|s| s.observe(user.as_ref())) {
                    info!(subject = %session.borrow().subject_id(), "session updated");
                }
                ControlFlow::Continue(())
            }
        });

        Ok(Self {
            session,
            store: app.store,
            listener,
            sign_ins,
            notices: Some(notice_rx),
        })
    }

    /// Subscribe to session changes.
    pub fn session(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn current_session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// The store handle from the initialized provider.
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    /// Non-fatal sign-in failures, as display messages. Available once.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.notices.take()
    }

    /// Detach the auth-state listener and abandon any sign-in in flight.
    /// Returns `false` if already deregistered.
    pub fn deregister(&self) -> bool {
        self.sign_ins.cancel();
        let detached = self.listener.cancel();
        if detached {
            debug!("auth-state listener deregistered");
        }
        detached
    }
}

impl Drop for IdentityBootstrapper {
    fn drop(&mut self) {
        self.deregister();
    }
}

// ── Sign-in ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct SignIn {
    auth: Arc<dyn IdentityProvider>,
    token: Option<SecretString>,
    in_flight: Arc<AtomicBool>,
    cancel: CancellationToken,
    notices: mpsc::UnboundedSender<String>,
}

impl SignIn {
    fn method(&self) -> &'static str {
        if self.token.is_some() {
            "custom token"
        } else {
            "anonymous"
        }
    }

    /// Spawn one sign-in attempt unless one is already running.
    fn begin(&self) {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("sign-in already in flight");
            return;
        }
        info!(method = self.method(), "no user signed in, signing in");

        let this = self.clone();
        tokio::spawn(async move {
            let attempt = async {
                match &this.token {
                    Some(token) => this.auth.sign_in_with_token(token).await,
                    None => this.auth.sign_in_anonymously().await,
                }
            };

            tokio::select! {
                biased;
                () = this.cancel.cancelled() => debug!("sign-in abandoned"),
                result = attempt => match result {
                    Ok(user) => debug!(uid = %user.uid, anonymous = user.is_anonymous, "sign-in succeeded"),
                    Err(e) => {
                        warn!(method = this.method(), error = %e, "sign-in failed");
                        let _ = this.notices.send(format!("Sign-in failed: {e}"));
                    }
                },
            }
            this.in_flight.store(false, Ordering::Release);
        });
    }
}
