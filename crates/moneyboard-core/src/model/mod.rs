// ── Domain model ──
//
// Session state owned by the bootstrapper, and the records and
// snapshots the subscriber republishes to the presentation layer.

pub mod record;
pub mod session;
pub mod summary;

// ── Re-exports ──────────────────────────────────────────────────────

pub use record::{Document, Record, Snapshot};
pub use session::{AuthUser, Session, SubjectId};
pub use summary::ExpenseSummary;
