// ── API-to-domain type conversions ──
//
// Bridges raw `moneyboard_api` Firestore documents into `Document`, and
// documents into the `Record`s the dashboard renders. Typed Firestore
// values are flattened to plain JSON on the way in.

use chrono::{DateTime, Utc};
use serde_json::Value;

use moneyboard_api::FirestoreDocument;

use crate::model::{Document, Record};

/// Field holding the server-assigned creation instant.
pub const TIMESTAMP_FIELD: &str = "timestamp";

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 string (Firestore `timestampValue` or metadata).
fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Read a timestamp from any of the shapes clients write:
/// an RFC 3339 string, a `{seconds, nanoseconds}` map (client SDK
/// serialization, with or without leading underscores), or epoch
/// milliseconds.
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_rfc3339(s),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(as_i64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, nanos)
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Integers may arrive as numbers or as decimal strings.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ── Conversions ────────────────────────────────────────────────────

impl From<FirestoreDocument> for Document {
    fn from(doc: FirestoreDocument) -> Self {
        Self {
            id: doc.id().to_owned(),
            fields: doc.decoded_fields(),
            create_time: doc.create_time.as_deref().and_then(parse_rfc3339),
            update_time: doc.update_time.as_deref().and_then(parse_rfc3339),
        }
    }
}

impl From<Document> for Record {
    fn from(doc: Document) -> Self {
        let timestamp = doc.fields.get(TIMESTAMP_FIELD).and_then(timestamp_from_value);
        Self {
            id: doc.id,
            fields: doc.fields,
            timestamp,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn firestore_document_is_flattened() {
        let raw: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/artifacts/a/public/data/expenses/e1",
            "fields": {
                "amount": { "doubleValue": 100.0 },
                "currency": { "stringValue": "CAD" },
                "timestamp": { "timestampValue": "2025-03-01T12:00:00Z" }
            },
            "createTime": "2025-03-01T12:00:00.123456Z",
            "updateTime": "2025-03-02T08:30:00Z"
        }))
        .unwrap();

        let doc = Document::from(raw);
        assert_eq!(doc.id, "e1");
        assert_eq!(doc.fields["currency"], json!("CAD"));
        assert_eq!(
            doc.update_time,
            Some(Utc.with_ymd_and_hms(2025, 3, 2, 8, 30, 0).unwrap())
        );

        let record = Record::from(doc);
        assert_eq!(
            record.timestamp,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn seconds_map_timestamp() {
        let ts = timestamp_from_value(&json!({ "seconds": 1_700_000_000, "nanoseconds": 0 }));
        assert_eq!(ts, DateTime::from_timestamp(1_700_000_000, 0));

        let underscored = timestamp_from_value(&json!({ "_seconds": "1700000000" }));
        assert_eq!(underscored, ts);
    }

    #[test]
    fn missing_or_garbage_timestamp_is_none() {
        let record = Record::from(Document::new("x", serde_json::Map::new()));
        assert!(record.timestamp.is_none());
        assert!(timestamp_from_value(&json!("yesterday")).is_none());
        assert!(timestamp_from_value(&json!(true)).is_none());
    }
}
