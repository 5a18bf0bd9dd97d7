// ── Runtime dashboard configuration ──
//
// These types describe *what* to connect to and how to pace it. They carry
// credential data but never touch disk: the TUI (via moneyboard-config)
// constructs a `DashboardConfig` and hands it to `Dashboard::new`.

use std::time::Duration;

use moneyboard_api::Endpoints;
use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;
use crate::path::CollectionPath;

pub const DEFAULT_APPLICATION_ID: &str = "default-app-id";

/// Firebase web-app configuration (`apiKey`, `projectId`, ...).
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: SecretString,
    pub auth_domain: Option<String>,
    pub project_id: String,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            auth_domain: None,
            project_id: project_id.into(),
            storage_bucket: None,
            messaging_sender_id: None,
            app_id: None,
        }
    }

    /// Both the API key and the project id are needed before any
    /// provider call can succeed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(CoreError::configuration("Firebase apiKey is empty"));
        }
        if self.project_id.trim().is_empty() {
            return Err(CoreError::configuration("Firebase projectId is empty"));
        }
        Ok(())
    }
}

/// Everything a `Dashboard` needs, passed explicitly into `start`.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// `None` when no Firebase configuration could be found.
    pub provider: Option<ProviderConfig>,
    /// Scopes the collection path: `/artifacts/{application_id}/...`.
    pub application_id: String,
    /// Pre-issued custom token; anonymous sign-in is used when absent.
    pub initial_auth_token: Option<SecretString>,
    /// How often the Firestore listener re-reads the collection.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// REST base URLs (production or emulator).
    pub endpoints: Endpoints,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            provider: None,
            application_id: DEFAULT_APPLICATION_ID.into(),
            initial_auth_token: None,
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
            endpoints: Endpoints::default(),
        }
    }
}

impl DashboardConfig {
    pub fn with_provider(provider: ProviderConfig) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }

    /// Check the provider section and return it.
    pub fn validate(&self) -> Result<&ProviderConfig, CoreError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            CoreError::configuration(
                "Firebase configuration is missing. Add a [profiles.<name>.firebase] section \
                 or set MONEYBOARD_FIREBASE_CONFIG.",
            )
        })?;
        provider.validate()?;
        if self.poll_interval.is_zero() {
            return Err(CoreError::configuration("poll interval must be non-zero"));
        }
        Ok(provider)
    }

    /// The fixed expenses collection for this application.
    pub fn collection_path(&self) -> Result<CollectionPath, CoreError> {
        CollectionPath::expenses(&self.application_id)
    }

    /// The sign-in token, treating an empty string as absent.
    pub fn auth_token(&self) -> Option<&SecretString> {
        self.initial_auth_token
            .as_ref()
            .filter(|t| !t.expose_secret().trim().is_empty())
    }
}
