//! Configuration for tailkit.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation into the connection settings `tailkit_core::Tailnet` needs.
//! The CLI layers its flag overrides on top of this.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tailkit_core::{CoreError, DEFAULT_BASE_URL, Tailnet, TlsMode, TransportConfig};

/// Environment variable read for the API key when a profile names none.
pub const API_KEY_ENV: &str = "TAILSCALE_API_KEY";
/// Environment variable read for the tailnet when a profile names none.
pub const TAILNET_ENV: &str = "TAILSCALE_TAILNET";

const KEYRING_SERVICE: &str = "tailkit";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("no tailnet configured for profile '{profile}'")]
    NoTailnet { profile: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

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
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named tailnet profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use, honoring an explicit choice first.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    /// The named profile. A missing `default` profile is treated as empty so
    /// env-only setups work without a config file.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile(name.into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            base_url: default_base_url(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

/// A named tailnet profile. Every field is optional; gaps are filled from
/// the environment and `[defaults]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Tailnet name (e.g. "example.com"). Falls back to `TAILSCALE_TAILNET`.
    pub tailnet: Option<String>,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Override the API base URL.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// Path to an additional CA certificate.
    pub ca_cert: Option<PathBuf>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tailkit", "tailkit").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("tailkit");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, then `TAILKIT_*` env vars (`__` separates nesting,
/// e.g. `TAILKIT_PROFILES__PROD__TAILNET`). A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TAILKIT_").split("__"))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if anything goes wrong.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config rendering ────────────────────────────────────────────────

/// Serialize config to TOML, the same layout `load_config_from` reads.
pub fn render_config(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
}

/// Resolve the API key: profile `api_key_env` → `TAILSCALE_API_KEY` →
/// system keyring → plaintext in the profile.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    let from_keyring = || {
        keyring_entry(profile_name)
            .and_then(|entry| entry.get_password())
            .ok()
    };
    resolve_api_key_with(profile, profile_name, &|name| std::env::var(name).ok(), &from_keyring)
}

fn resolve_api_key_with(
    profile: &Profile,
    profile_name: &str,
    env: &dyn Fn(&str) -> Option<String>,
    keyring: &dyn Fn() -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(key) = profile.api_key_env.as_deref().and_then(env) {
        debug!(profile = profile_name, "API key from profile env var");
        return Ok(SecretString::from(key));
    }

    // 2. Well-known env var
    if let Some(key) = env(API_KEY_ENV) {
        debug!(profile = profile_name, "API key from {API_KEY_ENV}");
        return Ok(SecretString::from(key));
    }

    // 3. System keyring
    if let Some(key) = keyring() {
        debug!(profile = profile_name, "API key from keyring");
        return Ok(SecretString::from(key));
    }

    // 4. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an API key for `profile_name` in the system keyring.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(key)?;
    Ok(())
}

/// Resolve the tailnet: profile → `TAILSCALE_TAILNET`.
pub fn resolve_tailnet(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    resolve_tailnet_with(profile, profile_name, &|name| std::env::var(name).ok())
}

fn resolve_tailnet_with(
    profile: &Profile,
    profile_name: &str,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    profile
        .tailnet
        .clone()
        .or_else(|| env(TAILNET_ENV))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConfigError::NoTailnet {
            profile: profile_name.into(),
        })
}

// ── Connection settings ─────────────────────────────────────────────

/// Everything needed to open a [`Tailnet`].
#[derive(Debug, Clone)]
pub struct Connection {
    pub base_url: String,
    pub tailnet: String,
    pub api_key: SecretString,
    pub transport: TransportConfig,
}

impl Connection {
    pub fn connect(&self) -> Result<Tailnet, CoreError> {
        Tailnet::connect(&self.base_url, &self.tailnet, &self.api_key, &self.transport)
    }
}

/// Check that `raw` is an absolute http(s) URL.
pub fn validate_base_url(raw: &str) -> Result<(), ConfigError> {
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL {raw}: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Values that take precedence over anything a profile says.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub tailnet: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout: Option<u64>,
}

/// Build connection settings from a profile.
///
/// Each setting comes from `overrides` first, then the profile (and its
/// credential chain), then `[defaults]`.
pub fn profile_to_connection(
    config: &Config,
    profile: &Profile,
    profile_name: &str,
    overrides: &Overrides,
) -> Result<Connection, ConfigError> {
    let base_url = overrides
        .base_url
        .clone()
        .or_else(|| profile.base_url.clone())
        .unwrap_or_else(|| config.defaults.base_url.clone());
    validate_base_url(&base_url)?;

    let tailnet = match overrides.tailnet {
        Some(ref t) if !t.is_empty() => t.clone(),
        _ => resolve_tailnet(profile, profile_name)?,
    };

    let api_key = match overrides.api_key {
        Some(ref key) => key.clone(),
        None => resolve_api_key(profile, profile_name)?,
    };

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);
    let timeout = overrides
        .timeout
        .or(profile.timeout)
        .unwrap_or(config.defaults.timeout);

    Ok(Connection {
        base_url,
        tailnet,
        api_key,
        transport: TransportConfig {
            tls,
            ..TransportConfig::default()
        }
        .with_timeout(Duration::from_secs(timeout)),
    })
}
