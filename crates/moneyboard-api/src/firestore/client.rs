// Async client for the Cloud Firestore REST API (v1).
//
// Base path: /v1/projects/{project}/databases/{database}/documents/
// Auth: Bearer ID token from the Identity Toolkit (optional for open rules)

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::models::{FirestoreDocument, ListDocumentsResponse};
use crate::endpoints::Endpoints;
use crate::error::Error;
use crate::response::{Surface, decode};
use crate::transport::TransportConfig;

const DEFAULT_DATABASE: &str = "(default)";
const PAGE_SIZE: u32 = 300;

/// Read-only Firestore client scoped to one project and database.
pub struct FirestoreClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    project_id: String,
    database: String,
}

impl FirestoreClient {
    // ── Constructors ─────────────────────────────────────────────────

    pub fn new(
        project_id: impl Into<String>,
        endpoints: Endpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, project_id, endpoints))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        project_id: impl Into<String>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            http,
            endpoints,
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_owned(),
        }
    }

    /// Target a named database instead of `(default)`.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// List every document in a collection, following `nextPageToken`
    /// until the server stops returning one.
    ///
    /// `collection` is a slash-separated path such as
    /// `/artifacts/app/public/data/expenses`; leading and trailing
    /// slashes are ignored. No filter or ordering is applied, so
    /// documents come back in the server's default (name) order.
    pub async fn list_documents(
        &self,
        collection: &str,
        id_token: Option<&SecretString>,
    ) -> Result<Vec<FirestoreDocument>, Error> {
        let url = self.collection_url(collection)?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(url.clone(), page_token.as_deref(), id_token)
                .await?;
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(collection, count = documents.len(), "listed documents");
        Ok(documents)
    }

    async fn list_page(
        &self,
        mut url: Url,
        page_token: Option<&str>,
        id_token: Option<&SecretString>,
    ) -> Result<ListDocumentsResponse, Error> {
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &PAGE_SIZE.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        debug!("GET {url}");

        let mut request = self.http.get(url);
        if let Some(token) = id_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request.send().await?;
        decode(resp, Surface::Firestore).await
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Each path segment is percent-encoded on its own, so document ids
    /// containing reserved characters cannot escape the collection.
    fn collection_url(&self, collection: &str) -> Result<Url, Error> {
        let mut url = self.endpoints.firestore.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::CannotBeABase(self.endpoints.firestore.to_string()))?;
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database.as_str(),
                "documents",
            ]);
            segments.extend(collection.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}
