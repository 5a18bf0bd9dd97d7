use thiserror::Error;

/// Top-level error type for the `moneyboard-api` crate.
///
/// Covers every failure mode across the REST surfaces: transport,
/// Identity Toolkit / Secure Token, and Firestore.
/// `moneyboard-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Identity ────────────────────────────────────────────────────
    /// Structured error from the Identity Toolkit or Secure Token API
    /// (e.g. `INVALID_CUSTOM_TOKEN`, `ADMIN_ONLY_OPERATION`).
    #[error("Identity API error (HTTP {status}): {message}")]
    Identity { status: u16, message: String },

    /// The account behind an ID token no longer exists.
    #[error("Account not found for the supplied ID token")]
    AccountNotFound,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The endpoint base URL cannot carry path segments (e.g. `data:` URLs).
    #[error("Endpoint URL cannot be a base: {0}")]
    CannotBeABase(String),

    /// Building the underlying HTTP client failed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Firestore ───────────────────────────────────────────────────
    /// Structured error from the Firestore REST API.
    #[error("Firestore error (HTTP {status}): {message}")]
    Firestore {
        status: u16,
        /// Canonical gRPC status name, e.g. `"PERMISSION_DENIED"`.
        code: Option<String>,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the ID token was rejected and a refresh
    /// (or a fresh sign-in) might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Firestore { status: 401, .. } => true,
            Self::Firestore { code, .. } => code.as_deref() == Some("UNAUTHENTICATED"),
            Self::Identity { message, .. } => [
                "TOKEN_EXPIRED",
                "INVALID_ID_TOKEN",
                "INVALID_REFRESH_TOKEN",
                "USER_NOT_FOUND",
                "USER_DISABLED",
            ]
            .iter()
            .any(|code| message.starts_with(code)),
            _ => false,
        }
    }

    /// Returns `true` if security rules denied the request.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Firestore { status: 403, .. } => true,
            Self::Firestore { code, .. } => code.as_deref() == Some("PERMISSION_DENIED"),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Firestore { status, .. } => matches!(status, 429 | 503),
            _ => false,
        }
    }

    /// Extract the canonical status name, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Firestore { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_by_status_or_code() {
        let by_status = Error::Firestore {
            status: 403,
            code: None,
            message: "denied".into(),
        };
        let by_code = Error::Firestore {
            status: 400,
            code: Some("PERMISSION_DENIED".into()),
            message: "denied".into(),
        };
        assert!(by_status.is_permission_denied());
        assert!(by_code.is_permission_denied());
        assert!(!by_status.is_auth_expired());
    }

    #[test]
    fn expired_identity_token_is_auth_expired() {
        let err = Error::Identity {
            status: 400,
            message: "TOKEN_EXPIRED".into(),
        };
        assert!(err.is_auth_expired());
        assert!(!err.is_transient());
    }

    #[test]
    fn unavailable_firestore_is_transient() {
        let err = Error::Firestore {
            status: 503,
            code: Some("UNAVAILABLE".into()),
            message: "backend unavailable".into(),
        };
        assert!(err.is_transient());
        assert_eq!(err.api_error_code(), Some("UNAVAILABLE"));
    }
}
