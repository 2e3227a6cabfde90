//! Configuration for the sitesync binary.
//!
//! TOML profiles (one per Dashboard organization), directory layout,
//! and API-key resolution (flag/env, keyring, plaintext). Everything is
//! merged through figment: built-in defaults, then the TOML file, then
//! `SITESYNC_*` environment variables.

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

use sitesync_core::{
    BackupStore, DEFAULT_BASE_URL, DEFAULT_CACHE_TTL_DAYS, DEFAULT_RETENTION_DAYS, InputLayout,
    TlsMode, TransportConfig,
};

/// Keyring service name; entries are keyed `<profile>/api-key`.
pub const KEYRING_SERVICE: &str = "sitesync";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("no organization id configured for profile '{profile}'")]
    NoOrganization { profile: String },

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
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named organization profiles.
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

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Root of the declared inputs (`vlans.json`, `sites/`, `samples/`).
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Where `vlan_report.json` is written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Network cache root; each profile gets its own subdirectory.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            backup_dir: default_backup_dir(),
            cache_dir: default_cache_dir(),
            retention_days: default_retention_days(),
            cache_ttl_days: default_cache_ttl_days(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(".sitesync-cache")
}
fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}
fn default_cache_ttl_days() -> u64 {
    DEFAULT_CACHE_TTL_DAYS
}

/// A named organization profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    pub org_id: Option<String>,

    /// Dashboard API root; defaults to the public endpoint.
    pub base_url: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// PEM file trusted in addition to the bundled roots.
    pub ca_cert: Option<PathBuf>,

    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sitesync", "sitesync").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sitesync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` (or the platform default) plus environment.
/// A missing file is not an error; the defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let config: Config = figment_for(&path)
        .merge(Env::prefixed("SITESYNC_").split("__"))
        .extract()?;
    Ok(config)
}

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
}

/// Render the config as TOML with plaintext API keys masked.
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    let mut shown = cfg.clone();
    for profile in shown.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(REDACTED.into());
        }
    }
    Ok(toml::to_string_pretty(&shown)?)
}

// ── Resolution ──────────────────────────────────────────────────────

/// Values taken from the command line; each one beats the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub org_id: Option<String>,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub timeout: Option<u64>,
}

/// Working directories for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub backups: PathBuf,
    pub cache: PathBuf,
}

/// Fully resolved settings for one profile.
#[derive(Debug)]
pub struct Settings {
    pub profile: String,
    pub org_id: Option<String>,
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub transport: TransportConfig,
    pub dirs: Dirs,
    pub retention_days: u32,
    pub cache_ttl_days: u64,
}

impl Settings {
    pub fn require_org_id(&self) -> Result<&str, ConfigError> {
        self.org_id
            .as_deref()
            .ok_or_else(|| ConfigError::NoOrganization {
                profile: self.profile.clone(),
            })
    }

    pub fn require_api_key(&self) -> Result<&SecretString, ConfigError> {
        self.api_key
            .as_ref()
            .ok_or_else(|| ConfigError::NoCredentials {
                profile: self.profile.clone(),
            })
    }

    pub fn layout(&self) -> InputLayout {
        InputLayout::new(&self.dirs.input)
    }

    pub fn backup_store(&self) -> BackupStore {
        BackupStore::new(&self.dirs.backups).with_retention_days(self.retention_days)
    }
}

/// Merge `overrides` over the selected profile and the defaults.
///
/// An explicitly named profile must exist. The default profile may be
/// absent, in which case flags and environment supply everything.
pub fn resolve(config: &Config, overrides: Overrides) -> Result<Settings, ConfigError> {
    let explicit = overrides.profile.is_some();
    let name = overrides
        .profile
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    let fallback = Profile::default();
    let profile = match config.profiles.get(&name) {
        Some(profile) => profile,
        None if explicit => {
            return Err(ConfigError::Validation {
                field: "profile".into(),
                reason: format!("profile '{name}' not found in config"),
            });
        }
        None => &fallback,
    };

    let base_url = overrides
        .base_url
        .or_else(|| profile.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.into());
    url::Url::parse(&base_url).map_err(|e| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("{base_url}: {e}"),
    })?;

    let timeout = overrides
        .timeout
        .or(profile.timeout)
        .unwrap_or(config.defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least one second".into(),
        });
    }
    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    let api_key = overrides
        .api_key
        .or_else(|| resolve_api_key(profile, &name));

    let defaults = &config.defaults;
    let dirs = Dirs {
        input: overrides
            .input_dir
            .unwrap_or_else(|| defaults.input_dir.clone()),
        output: overrides
            .output_dir
            .unwrap_or_else(|| defaults.output_dir.clone()),
        backups: defaults.backup_dir.clone(),
        cache: defaults.cache_dir.join(&name),
    };

    Ok(Settings {
        org_id: overrides.org_id.or_else(|| profile.org_id.clone()),
        profile: name,
        base_url,
        api_key,
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(timeout),
        },
        dirs,
        retention_days: defaults.retention_days,
        cache_ttl_days: defaults.cache_ttl_days,
    })
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Walk the profile's credential chain: `api_key_env`, keyring, plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    profile.api_key.clone().map(SecretString::from)
}
