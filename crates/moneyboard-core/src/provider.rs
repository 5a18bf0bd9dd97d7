// ── Provider seams ──
//
// The identity service and document store are external collaborators.
// Both expose their listeners as streams: dropping a stream detaches the
// underlying listener.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use secrecy::SecretString;

use crate::config::ProviderConfig;
use crate::error::CoreError;
use crate::model::{AuthUser, Document};
use crate::path::CollectionPath;

/// Auth-state changes. The first item is the state at subscription time.
pub type AuthStateStream = BoxStream<'static, Option<AuthUser>>;

/// Full-collection deliveries. An `Err` item is the listener's last.
pub type SnapshotStream = BoxStream<'static, Result<Vec<Document>, CoreError>>;

/// Identity of a store handle, so a subscriber can tell when the handle
/// behind its subscription was swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    /// A process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

/// Initializes provider services from configuration.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn initialize(&self, config: &ProviderConfig) -> Result<ProviderApp, CoreError>;
}

/// The identity half of an initialized provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Persistent auth-state listener.
    fn on_auth_state_changed(&self) -> AuthStateStream;

    fn current_user(&self) -> Option<AuthUser>;

    async fn sign_in_with_token(&self, token: &SecretString) -> Result<AuthUser, CoreError>;

    async fn sign_in_anonymously(&self) -> Result<AuthUser, CoreError>;
}

/// The document half of an initialized provider.
pub trait DocumentStore: Send + Sync {
    fn id(&self) -> StoreId;

    /// Unfiltered, unordered listener on one collection. Every item
    /// carries the whole collection.
    fn on_snapshot(&self, path: &CollectionPath) -> SnapshotStream;
}

/// Handles produced by [`Backend::initialize`].
#[derive(Clone)]
pub struct ProviderApp {
    pub auth: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for ProviderApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderApp")
            .field("store", &self.store.id())
            .finish_non_exhaustive()
    }
}
