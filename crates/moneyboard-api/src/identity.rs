// Identity Toolkit + Secure Token client
//
// Anonymous sign-up, custom-token sign-in, account lookup, and ID token
// refresh. Every call is keyed by the project's web API key; the
// resulting ID token authorizes Firestore requests as a Bearer token.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::endpoints::{self, Endpoints};
use crate::error::Error;
use crate::response::{Surface, decode};
use crate::transport::TransportConfig;

/// Credentials returned by every successful sign-in or refresh.
#[derive(Debug, Clone)]
pub struct IdTokenGrant {
    /// Short-lived JWT presented to Firestore.
    pub id_token: SecretString,
    /// Long-lived token exchanged for new ID tokens.
    pub refresh_token: SecretString,
    /// Lifetime of `id_token` from the moment it was issued.
    pub expires_in: Duration,
    /// The account's uid.
    pub local_id: String,
    /// Whether the account was created by anonymous sign-up.
    pub is_anonymous: bool,
}

/// Account metadata from `accounts:lookup`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub provider_user_info: Vec<serde_json::Value>,
}

impl AccountInfo {
    /// Anonymous accounts have no linked provider and no email.
    pub fn is_anonymous(&self) -> bool {
        self.provider_user_info.is_empty() && self.email.is_none()
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    #[serde(default)]
    local_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

/// The Secure Token API answers in snake_case, unlike Identity Toolkit.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

// ── Client ──────────────────────────────────────────────────────────

/// HTTP client for the Identity Toolkit and Secure Token APIs.
pub struct IdentityClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    api_key: SecretString,
}

impl IdentityClient {
    /// Create a new identity client from a `TransportConfig`.
    pub fn new(
        api_key: SecretString,
        endpoints: Endpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, api_key, endpoints))
    }

    /// Create an identity client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, api_key: SecretString, endpoints: Endpoints) -> Self {
        Self {
            http,
            endpoints,
            api_key,
        }
    }

    /// Create a brand-new anonymous account.
    ///
    /// `POST v1/accounts:signUp` with an empty credential set.
    pub async fn sign_up_anonymously(&self) -> Result<IdTokenGrant, Error> {
        let url = self.identity_url("v1/accounts:signUp")?;
        debug!("anonymous sign-up");

        let resp: SignInResponse = self
            .post_json(url, &json!({ "returnSecureToken": true }))
            .await?;

        let local_id = resp.local_id.clone().unwrap_or_default();
        grant(resp.id_token, resp.refresh_token, &resp.expires_in, local_id, true)
    }

    /// Exchange a server-minted custom token for an ID token.
    ///
    /// The sign-in response carries no uid, so an `accounts:lookup`
    /// round-trip resolves it.
    pub async fn sign_in_with_custom_token(
        &self,
        token: &SecretString,
    ) -> Result<IdTokenGrant, Error> {
        let url = self.identity_url("v1/accounts:signInWithCustomToken")?;
        debug!("custom token sign-in");

        let resp: SignInResponse = self
            .post_json(
                url,
                &json!({
                    "token": token.expose_secret(),
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let id_token = SecretString::from(resp.id_token.clone());
        let local_id = match resp.local_id.clone() {
            Some(id) if !id.is_empty() => id,
            _ => self.lookup(&id_token).await?.local_id,
        };

        grant(resp.id_token, resp.refresh_token, &resp.expires_in, local_id, false)
    }

    /// Fetch account metadata for an ID token.
    pub async fn lookup(&self, id_token: &SecretString) -> Result<AccountInfo, Error> {
        let url = self.identity_url("v1/accounts:lookup")?;

        let resp: LookupResponse = self
            .post_json(url, &json!({ "idToken": id_token.expose_secret() }))
            .await?;

        resp.users.into_iter().next().ok_or(Error::AccountNotFound)
    }

    /// Exchange a refresh token for a fresh ID token.
    ///
    /// `POST v1/token` on the Secure Token API, form-encoded.
    pub async fn refresh(
        &self,
        refresh_token: &SecretString,
        is_anonymous: bool,
    ) -> Result<IdTokenGrant, Error> {
        let mut url = endpoints::join(&self.endpoints.secure_token, "v1/token")?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        debug!("refreshing ID token");

        let resp = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
            ])
            .send()
            .await?;
        let resp: RefreshResponse = decode(resp, Surface::Identity).await?;

        grant(
            resp.id_token,
            resp.refresh_token,
            &resp.expires_in,
            resp.user_id,
            is_anonymous,
        )
    }

    // ── Private helpers ─────────────────────────────────────────────

    fn identity_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = endpoints::join(&self.endpoints.identity, path)?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<T, Error> {
        let resp = self.http.post(url).json(body).send().await?;
        decode(resp, Surface::Identity).await
    }
}

fn grant(
    id_token: String,
    refresh_token: String,
    expires_in: &str,
    local_id: String,
    is_anonymous: bool,
) -> Result<IdTokenGrant, Error> {
    let secs: u64 = expires_in
        .trim()
        .parse()
        .map_err(|_| Error::Deserialization {
            message: format!("invalid expiresIn value '{expires_in}'"),
            body: expires_in.to_owned(),
        })?;

    Ok(IdTokenGrant {
        id_token: SecretString::from(id_token),
        refresh_token: SecretString::from(refresh_token),
        expires_in: Duration::from_secs(secs),
        local_id,
        is_anonymous,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn grant_parses_expiry_seconds() {
        let g = grant("id".into(), "refresh".into(), "3600", "uid-1".into(), true).unwrap();
        assert_eq!(g.expires_in, Duration::from_secs(3600));
        assert_eq!(g.local_id, "uid-1");
        assert!(g.is_anonymous);
    }

    #[test]
    fn grant_rejects_non_numeric_expiry() {
        let err = grant("id".into(), "refresh".into(), "soon", "uid".into(), false).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn account_without_providers_is_anonymous() {
        let info: AccountInfo =
            serde_json::from_value(serde_json::json!({ "localId": "abc" })).unwrap();
        assert!(info.is_anonymous());

        let linked: AccountInfo = serde_json::from_value(serde_json::json!({
            "localId": "abc",
            "email": "a@example.com",
            "providerUserInfo": [{ "providerId": "password" }]
        }))
        .unwrap();
        assert!(!linked.is_anonymous());
    }
}
