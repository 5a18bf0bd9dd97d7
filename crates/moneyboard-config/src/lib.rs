//! Shared configuration for the moneyboard dashboard.
//!
//! TOML profiles, process-scoped overrides, sign-in token resolution
//! (env + keyring + plaintext), and translation to
//! `moneyboard_core::DashboardConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use moneyboard_api::Endpoints;
use moneyboard_core::config::DEFAULT_APPLICATION_ID;
use moneyboard_core::{DashboardConfig, ProviderConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// JSON web-app config that replaces the profile's `[firebase]` section.
pub const FIREBASE_CONFIG_ENV: &str = "MONEYBOARD_FIREBASE_CONFIG";
/// Overrides the profile's application id.
pub const APP_ID_ENV: &str = "MONEYBOARD_APP_ID";
/// Pre-issued custom token, checked before any other token source.
pub const AUTH_TOKEN_ENV: &str = "MONEYBOARD_INITIAL_AUTH_TOKEN";

const AUTH_EMULATOR_ENV: &str = "FIREBASE_AUTH_EMULATOR_HOST";
const FIRESTORE_EMULATOR_ENV: &str = "FIRESTORE_EMULATOR_HOST";
const DEFAULT_AUTH_EMULATOR: &str = "127.0.0.1:9099";
const DEFAULT_FIRESTORE_EMULATOR: &str = "127.0.0.1:8080";

const KEYRING_SERVICE: &str = "moneyboard";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' is not defined")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named dashboard profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Select a profile by explicit name, falling back to `default_profile`.
    ///
    /// An explicitly named profile must exist. The implicit default may be
    /// absent from the file, in which case an empty profile is returned so
    /// that environment overrides alone can drive the dashboard.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get(name)
                .cloned()
                .map(|p| (name.to_owned(), p))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() });
        }

        let name = self.default_profile.as_deref().unwrap_or("default");
        let profile = self.profiles.get(name).cloned().unwrap_or_default();
        Ok((name.to_owned(), profile))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Collection re-read interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    5
}

/// A named dashboard profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Firebase web-app configuration.
    pub firebase: Option<FirebaseSection>,

    /// Scopes the expenses collection. Defaults to "default-app-id".
    pub application_id: Option<String>,

    /// Custom sign-in token (plaintext, prefer keyring or env var).
    pub initial_auth_token: Option<String>,

    /// Environment variable name containing the sign-in token.
    pub initial_auth_token_env: Option<String>,

    /// Auth emulator `host:port`.
    pub auth_emulator_host: Option<String>,

    /// Firestore emulator `host:port`.
    pub firestore_emulator_host: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval_secs: Option<u64>,
}

/// The Firebase web-app config object. Accepts both `snake_case` keys and
/// the `camelCase` keys of the console snippet.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FirebaseSection {
    #[serde(default, alias = "apiKey")]
    pub api_key: String,
    #[serde(alias = "authDomain")]
    pub auth_domain: Option<String>,
    #[serde(default, alias = "projectId")]
    pub project_id: String,
    #[serde(alias = "storageBucket")]
    pub storage_bucket: Option<String>,
    #[serde(alias = "messagingSenderId")]
    pub messaging_sender_id: Option<String>,
    #[serde(alias = "appId")]
    pub app_id: Option<String>,
}

impl FirebaseSection {
    /// Missing keys are left empty; `Dashboard::start` rejects them.
    pub fn to_provider_config(&self) -> ProviderConfig {
        let mut provider = ProviderConfig::new(self.api_key.clone(), self.project_id.clone());
        provider.auth_domain.clone_from(&self.auth_domain);
        provider.storage_bucket.clone_from(&self.storage_bucket);
        provider
            .messaging_sender_id
            .clone_from(&self.messaging_sender_id);
        provider.app_id.clone_from(&self.app_id);
        provider
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "moneyboard", "moneyboard").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("moneyboard");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + environment. A missing file yields defaults.
///
/// `MONEYBOARD_PROFILES__HOME__APPLICATION_ID=x` sets
/// `profiles.home.application_id`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("MONEYBOARD_")
                .ignore(&["FIREBASE_CONFIG", "APP_ID", "INITIAL_AUTH_TOKEN"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Lookup sources ──────────────────────────────────────────────────

type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// Where environment variables and keyring secrets are read from.
pub struct Sources {
    env: Lookup,
    keyring: Lookup,
}

impl Sources {
    /// Process environment and the system keyring.
    pub fn system() -> Self {
        Self {
            env: Box::new(|name| std::env::var(name).ok()),
            keyring: Box::new(|key| {
                keyring::Entry::new(KEYRING_SERVICE, key)
                    .ok()?
                    .get_password()
                    .ok()
            }),
        }
    }

    /// Fixed maps, for callers that must not touch process state.
    pub fn from_maps(env: HashMap<String, String>, keyring: HashMap<String, String>) -> Self {
        Self {
            env: Box::new(move |name| env.get(name).cloned()),
            keyring: Box::new(move |key| keyring.get(key).cloned()),
        }
    }

    fn env(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|v| !v.trim().is_empty())
    }

    fn keyring(&self, key: &str) -> Option<String> {
        (self.keyring)(key).filter(|v| !v.trim().is_empty())
    }
}

// ── Resolution ──────────────────────────────────────────────────────

/// Resolve the sign-in token. `None` means anonymous sign-in.
///
/// Order: `MONEYBOARD_INITIAL_AUTH_TOKEN`, the variable named by the
/// profile's `initial_auth_token_env`, the system keyring
/// (`{profile}/auth-token`), then plaintext in config.
pub fn resolve_auth_token(
    profile: &Profile,
    profile_name: &str,
    sources: &Sources,
) -> Option<SecretString> {
    if let Some(token) = sources.env(AUTH_TOKEN_ENV) {
        return Some(SecretString::from(token));
    }

    if let Some(ref env_name) = profile.initial_auth_token_env {
        if let Some(token) = sources.env(env_name) {
            return Some(SecretString::from(token));
        }
    }

    if let Some(token) = sources.keyring(&format!("{profile_name}/auth-token")) {
        return Some(SecretString::from(token));
    }

    profile
        .initial_auth_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(SecretString::from)
}

/// Resolve the provider config: `MONEYBOARD_FIREBASE_CONFIG` JSON wins
/// over the profile's `[firebase]` section. `None` when neither is set.
pub fn resolve_firebase(
    profile: &Profile,
    sources: &Sources,
) -> Result<Option<ProviderConfig>, ConfigError> {
    if let Some(json) = sources.env(FIREBASE_CONFIG_ENV) {
        let section: FirebaseSection =
            serde_json::from_str(&json).map_err(|e| ConfigError::Validation {
                field: FIREBASE_CONFIG_ENV.into(),
                reason: e.to_string(),
            })?;
        return Ok(Some(section.to_provider_config()));
    }
    Ok(profile.firebase.as_ref().map(FirebaseSection::to_provider_config))
}

fn resolve_application_id(profile: &Profile, sources: &Sources) -> String {
    sources
        .env(APP_ID_ENV)
        .or_else(|| {
            profile
                .application_id
                .clone()
                .filter(|id| !id.trim().is_empty())
        })
        .unwrap_or_else(|| DEFAULT_APPLICATION_ID.into())
}

/// Production endpoints unless an emulator host is configured in the
/// profile or via the standard `*_EMULATOR_HOST` variables.
fn resolve_endpoints(profile: &Profile, sources: &Sources) -> Result<Endpoints, ConfigError> {
    let auth = profile
        .auth_emulator_host
        .clone()
        .or_else(|| sources.env(AUTH_EMULATOR_ENV));
    let firestore = profile
        .firestore_emulator_host
        .clone()
        .or_else(|| sources.env(FIRESTORE_EMULATOR_ENV));

    if auth.is_none() && firestore.is_none() {
        return Ok(Endpoints::default());
    }

    let auth = auth.unwrap_or_else(|| DEFAULT_AUTH_EMULATOR.into());
    let firestore = firestore.unwrap_or_else(|| DEFAULT_FIRESTORE_EMULATOR.into());
    debug!(%auth, %firestore, "using emulator endpoints");
    Endpoints::emulator(&auth, &firestore).map_err(|e| ConfigError::Validation {
        field: "emulator_host".into(),
        reason: e.to_string(),
    })
}

/// Build a `DashboardConfig` from a profile using process env and keyring.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    resolve_dashboard_config(profile, profile_name, defaults, &Sources::system())
}

/// Build a `DashboardConfig` from a profile using explicit lookup sources.
///
/// A missing Firebase section is not an error here; `Dashboard::start`
/// reports it as a configuration failure.
pub fn resolve_dashboard_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    sources: &Sources,
) -> Result<DashboardConfig, ConfigError> {
    let poll_secs = profile.poll_interval_secs.unwrap_or(defaults.poll_interval_secs);
    if poll_secs == 0 {
        return Err(ConfigError::Validation {
            field: "poll_interval_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    Ok(DashboardConfig {
        provider: resolve_firebase(profile, sources)?,
        application_id: resolve_application_id(profile, sources),
        initial_auth_token: resolve_auth_token(profile, profile_name, sources),
        poll_interval: Duration::from_secs(poll_secs),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        endpoints: resolve_endpoints(profile, sources)?,
    })
}

/// Load the config file, select a profile, and resolve it.
///
/// Returns the selected profile name alongside the config.
pub fn load_dashboard_config(
    profile_name: Option<&str>,
) -> Result<(String, DashboardConfig), ConfigError> {
    let config = load_config()?;
    let (name, profile) = config.profile(profile_name)?;
    let dashboard = profile_to_dashboard_config(&profile, &name, &config.defaults)?;
    Ok((name, dashboard))
}
