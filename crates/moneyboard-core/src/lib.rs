//! Session and live-subscription lifecycle between `moneyboard-api` and
//! the terminal dashboard.
//!
//! - **[`Dashboard`]**: facade that validates configuration, runs the
//!   [`IdentityBootstrapper`], and drives a single reconciliation task
//!   owning the [`LiveCollectionSubscriber`]. Consumers watch a
//!   [`DashboardView`] and never touch provider handles directly.
//!
//! - **Provider seams** ([`provider`]): [`Backend`], [`IdentityProvider`]
//!   and [`DocumentStore`] traits. [`FirebaseBackend`] implements them over
//!   the Identity Toolkit and Firestore REST APIs.
//!
//! - **Domain model** ([`model`]): [`Session`] with sticky readiness,
//!   immutable [`Record`]s, and atomic [`Snapshot`] replacement.

pub mod bootstrap;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod firebase;
pub mod listener;
pub mod model;
pub mod path;
pub mod provider;
pub mod subscriber;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bootstrap::IdentityBootstrapper;
pub use config::{DashboardConfig, ProviderConfig};
pub use dashboard::{Dashboard, DashboardView, Phase};
pub use error::{CoreError, FailureKind};
pub use firebase::FirebaseBackend;
pub use listener::ListenerHandle;
pub use model::{AuthUser, Document, ExpenseSummary, Record, Session, Snapshot, SubjectId};
pub use path::CollectionPath;
pub use provider::{Backend, DocumentStore, IdentityProvider, ProviderApp, StoreId};
pub use subscriber::{ActivationKey, LiveCollectionSubscriber, SubscriberEvent, SubscriberUpdate};
