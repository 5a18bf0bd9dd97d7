use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value;

/// One document as returned by `documents.list`.
///
/// `fields` holds Firestore's typed-value encoding
/// (`{"amount": {"doubleValue": 100.0}}`); use [`decoded_fields`]
/// for plain JSON.
///
/// [`decoded_fields`]: FirestoreDocument::decoded_fields
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreDocument {
    /// Full resource name:
    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// RFC 3339, set by the server.
    #[serde(default)]
    pub create_time: Option<String>,
    /// RFC 3339, bumped on every write.
    #[serde(default)]
    pub update_time: Option<String>,
}

impl FirestoreDocument {
    /// The last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Fields with Firestore typed values unwrapped into plain JSON.
    pub fn decoded_fields(&self) -> Map<String, Value> {
        value::decode_fields(&self.fields)
    }
}

/// One page of `documents.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<FirestoreDocument>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_is_last_name_segment() {
        let doc: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/demo/databases/(default)/documents/artifacts/app/public/data/expenses/abc",
            "fields": { "category": { "stringValue": "Groceries" } },
            "updateTime": "2025-01-02T03:04:05.000000Z"
        }))
        .unwrap();

        assert_eq!(doc.id(), "abc");
        assert_eq!(doc.decoded_fields()["category"], json!("Groceries"));
        assert!(doc.create_time.is_none());
    }

    #[test]
    fn empty_page_has_no_documents() {
        let page: ListDocumentsResponse = serde_json::from_value(json!({})).unwrap();
        assert!(page.documents.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
