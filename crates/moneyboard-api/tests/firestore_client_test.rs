#![allow(clippy::unwrap_used)]
// Integration tests for `FirestoreClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use moneyboard_api::{Endpoints, Error, FirestoreClient};

const COLLECTION: &str = "/artifacts/app-1/public/data/expenses";
const LIST_PATH: &str =
    "/v1/projects/demo/databases/(default)/documents/artifacts/app-1/public/data/expenses";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, FirestoreClient) {
    let server = MockServer::start().await;
    let endpoints = Endpoints::single_host(&Url::parse(&server.uri()).unwrap());
    let client = FirestoreClient::with_client(reqwest::Client::new(), "demo", endpoints);
    (server, client)
}

fn doc(id: &str) -> serde_json::Value {
    json!({
        "name": format!("projects/demo/databases/(default)/documents/artifacts/app-1/public/data/expenses/{id}"),
        "fields": {
            "amount": { "doubleValue": 100.0 },
            "currency": { "stringValue": "CAD" }
        },
        "createTime": "2025-01-01T00:00:00Z",
        "updateTime": "2025-01-01T00:00:00Z"
    })
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_documents_single_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("pageSize", "300"))
        .and(header("authorization", "Bearer id-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "documents": [doc("a"), doc("b"), doc("c")] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = SecretString::from("id-token");
    let docs = client.list_documents(COLLECTION, Some(&token)).await.unwrap();

    let ids: Vec<&str> = docs.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(docs[0].decoded_fields()["currency"], json!("CAD"));
}

#[tokio::test]
async fn test_list_documents_follows_page_tokens() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documents": [doc("c")] })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("a"), doc("b")],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let docs = client.list_documents(COLLECTION, None).await.unwrap();

    let ids: Vec<&str> = docs.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_empty_collection() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let docs = client.list_documents(COLLECTION, None).await.unwrap();
    assert!(docs.is_empty());
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_permission_denied() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "Missing or insufficient permissions.",
                "status": "PERMISSION_DENIED"
            }
        })))
        .mount(&server)
        .await;

    let err = client.list_documents(COLLECTION, None).await.unwrap_err();

    assert!(err.is_permission_denied(), "unexpected error: {err:?}");
    assert!(matches!(err, Error::Firestore { status: 403, .. }));
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list_documents(COLLECTION, None).await.unwrap_err();

    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}
