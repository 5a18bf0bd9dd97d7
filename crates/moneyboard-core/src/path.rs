// ── Collection paths ──
//
// A Firestore collection lives at an odd number of path segments
// (`collection/doc/collection/...`). The dashboard reads exactly one:
// `/artifacts/{applicationId}/public/data/expenses`.

use std::fmt;

use crate::error::CoreError;

/// A validated, slash-separated collection path with a leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Parse and normalize a collection path.
    ///
    /// Leading and trailing slashes are optional; empty segments and an
    /// even segment count (a document path) are rejected.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(CoreError::configuration("collection path is empty"));
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(CoreError::configuration(format!(
                "collection path '{raw}' has an empty segment"
            )));
        }
        if segments.len() % 2 == 0 {
            return Err(CoreError::configuration(format!(
                "'{raw}' names a document, not a collection"
            )));
        }

        Ok(Self(format!("/{trimmed}")))
    }

    /// The public expenses collection scoped by application id.
    pub fn expenses(application_id: &str) -> Result<Self, CoreError> {
        let app = application_id.trim();
        if app.is_empty() || app.contains('/') {
            return Err(CoreError::configuration(format!(
                "invalid application id '{application_id}'"
            )));
        }
        Self::parse(&format!("/artifacts/{app}/public/data/expenses"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.trim_start_matches('/').split('/')
    }

    /// The collection id, i.e. the final segment.
    pub fn collection_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
