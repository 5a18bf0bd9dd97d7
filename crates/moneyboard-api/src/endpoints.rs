//! Base URLs for the three REST surfaces.
//!
//! Production defaults point at the Google-hosted APIs. The Firebase
//! emulator suite serves Identity Toolkit and Secure Token from the auth
//! emulator under host-named path prefixes, and Firestore from its own port.

use url::Url;

use crate::error::Error;

const IDENTITY_TOOLKIT: &str = "https://identitytoolkit.googleapis.com/";
const SECURE_TOKEN: &str = "https://securetoken.googleapis.com/";
const FIRESTORE: &str = "https://firestore.googleapis.com/";

/// REST base URLs. Every base ends with `/` so relative joins append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Identity Toolkit (`accounts:signUp`, `accounts:signInWithCustomToken`, ...).
    pub identity: Url,
    /// Secure Token service (`token` refresh grant).
    pub secure_token: Url,
    /// Cloud Firestore REST.
    pub firestore: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            identity: Url::parse(IDENTITY_TOOLKIT).expect("static endpoint URL"),
            secure_token: Url::parse(SECURE_TOKEN).expect("static endpoint URL"),
            firestore: Url::parse(FIRESTORE).expect("static endpoint URL"),
        }
    }
}

impl Endpoints {
    /// Endpoints for a local emulator suite.
    ///
    /// `auth_host` and `firestore_host` are `host:port` pairs, e.g.
    /// `127.0.0.1:9099` and `127.0.0.1:8080`.
    pub fn emulator(auth_host: &str, firestore_host: &str) -> Result<Self, Error> {
        Ok(Self {
            identity: Url::parse(&format!("http://{auth_host}/identitytoolkit.googleapis.com/"))?,
            secure_token: Url::parse(&format!("http://{auth_host}/securetoken.googleapis.com/"))?,
            firestore: Url::parse(&format!("http://{firestore_host}/"))?,
        })
    }

    /// Point every surface at a single base URL. Used by tests against a
    /// mock server that serves all routes.
    pub fn single_host(base: &Url) -> Self {
        let base = with_trailing_slash(base);
        Self {
            identity: base.clone(),
            secure_token: base.clone(),
            firestore: base,
        }
    }
}

/// Join a relative API path onto a base, keeping the base's path prefix.
pub(crate) fn join(base: &Url, path: &str) -> Result<Url, Error> {
    Ok(with_trailing_slash(base).join(path)?)
}

fn with_trailing_slash(base: &Url) -> Url {
    if base.path().ends_with('/') {
        return base.clone();
    }
    let mut fixed = base.clone();
    let path = format!("{}/", base.path());
    fixed.set_path(&path);
    fixed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn production_defaults() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.identity.host_str(), Some("identitytoolkit.googleapis.com"));
        assert_eq!(endpoints.firestore.scheme(), "https");
    }

    #[test]
    fn emulator_prefixes_host_names() {
        let endpoints = Endpoints::emulator("127.0.0.1:9099", "127.0.0.1:8080").unwrap();
        let url = join(&endpoints.identity, "v1/accounts:signUp").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1/accounts:signUp"
        );
    }

    #[test]
    fn join_keeps_prefix_without_trailing_slash() {
        let base = Url::parse("http://localhost:4000/prefix").unwrap();
        let url = join(&base, "v1/token").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/prefix/v1/token");
    }
}
