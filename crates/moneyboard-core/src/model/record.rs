// ── Records and snapshots ──

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// A document as delivered by a `DocumentStore`, before mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
            create_time: None,
            update_time: None,
        }
    }
}

/// One expense record. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    pub fields: Map<String, Value>,
    /// The `timestamp` field, when present and parseable.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// The full collection at one logical point in time.
///
/// Cheap to clone; a new delivery replaces the whole sequence.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Arc<Vec<Arc<Record>>>,
}

impl Snapshot {
    /// Build a snapshot in delivery order.
    ///
    /// Ids are unique within a snapshot: if a provider repeats an id,
    /// the first occurrence wins.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for record in records {
            if seen.insert(record.id.clone()) {
                out.push(Arc::new(record));
            } else {
                warn!(id = %record.id, "duplicate document id in snapshot, keeping first");
            }
        }
        Self {
            records: Arc::new(out),
        }
    }

    pub fn records(&self) -> &Arc<Vec<Arc<Record>>> {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    /// Whether two snapshots share the same backing allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }
}
