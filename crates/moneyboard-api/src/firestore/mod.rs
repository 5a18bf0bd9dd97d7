// Cloud Firestore REST surface.
//
// Read-only: the dashboard lists one collection and never writes.

mod client;
mod models;
pub mod value;

pub use client::FirestoreClient;
pub use models::{FirestoreDocument, ListDocumentsResponse};
