// ── Firebase backend ──
//
// Implements the provider traits over the Identity Toolkit and Firestore
// REST APIs. Both halves share one HTTP client; the store asks the auth
// half for a fresh ID token on every read.

mod auth;
mod store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moneyboard_api::{Endpoints, FirestoreClient, IdentityClient, TransportConfig};
use tracing::info;

use crate::config::{DashboardConfig, ProviderConfig};
use crate::error::CoreError;
use crate::provider::{Backend, ProviderApp};

pub use auth::FirebaseAuth;
pub use store::FirebaseStore;

/// [`Backend`] for a Firebase project (or the local emulator suite).
#[derive(Debug, Clone)]
pub struct FirebaseBackend {
    endpoints: Endpoints,
    transport: TransportConfig,
    poll_interval: Duration,
}

impl FirebaseBackend {
    pub fn new(endpoints: Endpoints, transport: TransportConfig, poll_interval: Duration) -> Self {
        Self {
            endpoints,
            transport,
            poll_interval,
        }
    }

    /// Endpoints, timeout and poll interval taken from a dashboard config.
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            config.endpoints.clone(),
            TransportConfig::default().with_timeout(config.timeout),
            config.poll_interval,
        )
    }
}

#[async_trait]
impl Backend for FirebaseBackend {
    async fn initialize(&self, config: &ProviderConfig) -> Result<ProviderApp, CoreError> {
        config.validate()?;
        let http = self.transport.build_client()?;

        let identity =
            IdentityClient::with_client(http.clone(), config.api_key.clone(), self.endpoints.clone());
        let firestore =
            FirestoreClient::with_client(http, config.project_id.clone(), self.endpoints.clone());

        let auth = Arc::new(FirebaseAuth::new(identity));
        let store = Arc::new(FirebaseStore::new(
            Arc::new(firestore),
            Arc::clone(&auth),
            self.poll_interval,
        ));

        info!(
            project = %config.project_id,
            auth_domain = config.auth_domain.as_deref().unwrap_or("-"),
            "firebase services initialized"
        );
        Ok(ProviderApp { auth, store })
    }
}
