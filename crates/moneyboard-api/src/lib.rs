// moneyboard-api: Async Rust client for the Firebase REST surfaces
// (Identity Toolkit, Secure Token, Cloud Firestore).

pub mod endpoints;
pub mod error;
pub mod firestore;
pub mod identity;
mod response;
pub mod transport;

pub use endpoints::Endpoints;
pub use error::Error;
pub use firestore::{FirestoreClient, FirestoreDocument};
pub use identity::{AccountInfo, IdTokenGrant, IdentityClient};
pub use transport::TransportConfig;
