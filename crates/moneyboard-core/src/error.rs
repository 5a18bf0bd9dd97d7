// ── Core error types ──
//
// User-facing errors from moneyboard-core. Consumers never see HTTP
// status codes or JSON parse failures directly; the
// `From<moneyboard_api::Error>` impl translates transport-layer errors
// into domain variants.

use strum::Display;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Lifecycle failures (terminal) ────────────────────────────────
    /// Provider configuration absent or invalid. Raised before any
    /// provider call is made.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The provider could not be initialized.
    #[error("Failed to initialize provider services: {message}")]
    Initialization { message: String },

    /// The collection listener reported a fault after attach.
    #[error("Failed to fetch real-time data: {message}")]
    Subscription { message: String },

    // ── Provider errors ──────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Provider error: {message}")]
    Provider {
        message: String,
        /// Canonical status name (e.g. `"UNAVAILABLE"`), when reported.
        code: Option<String>,
        /// HTTP status code, when applicable.
        status: Option<u16>,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which terminal failure a dashboard ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FailureKind {
    #[strum(to_string = "configuration")]
    Configuration,
    #[strum(to_string = "initialization")]
    Initialization,
    #[strum(to_string = "subscription")]
    Subscription,
}

impl CoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Terminal classification, or `None` for errors that are reported
    /// but do not end the lifecycle (e.g. a failed sign-in attempt).
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Configuration { .. } => Some(FailureKind::Configuration),
            Self::Initialization { .. } => Some(FailureKind::Initialization),
            Self::Subscription { .. } => Some(FailureKind::Subscription),
            _ => None,
        }
    }

    /// Re-tag a provider fault as an initialization failure.
    pub(crate) fn into_initialization(self) -> Self {
        match self {
            Self::Initialization { .. } | Self::Configuration { .. } => self,
            other => Self::Initialization {
                message: other.detail(),
            },
        }
    }

    /// Re-tag a listener fault as a subscription failure.
    pub(crate) fn into_subscription(self) -> Self {
        match self {
            Self::Subscription { .. } => self,
            other => Self::Subscription {
                message: other.detail(),
            },
        }
    }

    /// The message without the variant prefix.
    fn detail(&self) -> String {
        match self {
            Self::Configuration { message }
            | Self::Initialization { message }
            | Self::Subscription { message }
            | Self::AuthenticationFailed { message }
            | Self::PermissionDenied { message }
            | Self::Provider { message, .. } => message.clone(),
            Self::Internal(message) => message.clone(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<moneyboard_api::Error> for CoreError {
    fn from(err: moneyboard_api::Error) -> Self {
        if err.is_permission_denied() {
            return CoreError::PermissionDenied {
                message: err.to_string(),
            };
        }

        match err {
            moneyboard_api::Error::Identity { message, .. } => {
                CoreError::AuthenticationFailed { message }
            }
            moneyboard_api::Error::AccountNotFound => CoreError::AuthenticationFailed {
                message: "account no longer exists".into(),
            },
            moneyboard_api::Error::Transport(ref e) => CoreError::Provider {
                message: e.to_string(),
                code: None,
                status: e.status().map(|s| s.as_u16()),
            },
            moneyboard_api::Error::InvalidUrl(e) => CoreError::Configuration {
                message: format!("Invalid URL: {e}"),
            },
            moneyboard_api::Error::CannotBeABase(url) => CoreError::Configuration {
                message: format!("Endpoint URL cannot be a base: {url}"),
            },
            moneyboard_api::Error::ClientBuild(message) => CoreError::Internal(message),
            moneyboard_api::Error::Firestore {
                status,
                code,
                message,
            } => CoreError::Provider {
                message,
                code,
                status: Some(status),
            },
            moneyboard_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_kinds() {
        assert_eq!(
            CoreError::configuration("missing").kind(),
            Some(FailureKind::Configuration)
        );
        assert_eq!(
            CoreError::AuthenticationFailed {
                message: "nope".into()
            }
            .kind(),
            None
        );
    }

    #[test]
    fn listener_fault_becomes_subscription() {
        let err = CoreError::PermissionDenied {
            message: "Missing or insufficient permissions.".into(),
        }
        .into_subscription();

        assert_eq!(err.kind(), Some(FailureKind::Subscription));
        assert_eq!(
            err.to_string(),
            "Failed to fetch real-time data: Missing or insufficient permissions."
        );
    }

    #[test]
    fn configuration_survives_initialization_retag() {
        let err = CoreError::configuration("bad endpoint").into_initialization();
        assert_eq!(err.kind(), Some(FailureKind::Configuration));
    }

    #[test]
    fn firestore_permission_denied_maps_by_code() {
        let api = moneyboard_api::Error::Firestore {
            status: 403,
            code: Some("PERMISSION_DENIED".into()),
            message: "denied".into(),
        };
        assert!(matches!(
            CoreError::from(api),
            CoreError::PermissionDenied { .. }
        ));
    }

    #[test]
    fn identity_rejection_is_authentication_failure() {
        let api = moneyboard_api::Error::Identity {
            status: 400,
            message: "INVALID_CUSTOM_TOKEN".into(),
        };
        match CoreError::from(api) {
            CoreError::AuthenticationFailed { message } => {
                assert_eq!(message, "INVALID_CUSTOM_TOKEN");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn failure_kind_display() {
        assert_eq!(FailureKind::Subscription.to_string(), "subscription");
    }
}
