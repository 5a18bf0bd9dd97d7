// ── Identity session types ──

use serde::{Deserialize, Serialize};
use std::fmt;

// ── SubjectId ───────────────────────────────────────────────────────

/// Identifier of the signed-in subject, or the `"anonymous"` sentinel
/// when an auth-state event resolved no user.
///
/// Empty only before the first auth-state event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_owned())
    }

    /// `true` for the sentinel, not for anonymous *accounts* (which
    /// have a real uid).
    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── AuthUser ────────────────────────────────────────────────────────

/// A user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub is_anonymous: bool,
}

impl AuthUser {
    pub fn new(uid: impl Into<String>, is_anonymous: bool) -> Self {
        Self {
            uid: uid.into(),
            is_anonymous,
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// Identity session state.
///
/// `is_ready` goes false -> true on the first auth-state event and never
/// back. Nothing in the API clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    subject_id: SubjectId,
    is_ready: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that has already observed `subject`.
    pub fn ready(subject: SubjectId) -> Self {
        Self {
            subject_id: subject,
            is_ready: true,
        }
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    /// Apply one auth-state event. Returns `true` if anything changed.
    pub(crate) fn observe(&mut self, user: Option<&AuthUser>) -> bool {
        let subject = user.map_or_else(SubjectId::anonymous, |u| SubjectId::new(u.uid.clone()));
        let changed = !self.is_ready || self.subject_id != subject;
        self.subject_id = subject;
        self.is_ready = true;
        changed
    }
}
