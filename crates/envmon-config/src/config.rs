//! Client configuration.
//!
//! # Configuration
//!
//! ```toml
//! [server]
//! url = "https://monitoreo.example.org/api/"
//! timeout_secs = 30
//!
//! [session]
//! file = "~/.local/share/envmon/session.json"
//! ```
//!
//! # Environment Variables
//!
//! - `ENVMON_CONFIG_DIR` - Override the directory holding `config.toml`
//! - `ENVMON_API_URL` - Override the backend URL
//! - `ENVMON_TIMEOUT_SECS` - Override the request timeout
//! - `ENVMON_SESSION_FILE` - Override the session file location

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Application name used for config and data directories.
const APP_NAME: &str = "envmon";

/// User config file name.
const USER_CONFIG_FILE: &str = "config.toml";

/// Session file name inside the data directory.
const SESSION_FILE: &str = "session.json";

/// Backend used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/api/";

const CONFIG_DIR_ENV: &str = "ENVMON_CONFIG_DIR";
const API_URL_ENV: &str = "ENVMON_API_URL";
const TIMEOUT_ENV: &str = "ENVMON_TIMEOUT_SECS";
const SESSION_FILE_ENV: &str = "ENVMON_SESSION_FILE";

/// Root client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend connection settings.
    pub server: ServerConfig,
    /// Session persistence settings.
    pub session: SessionConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// API root URL. Default: `http://localhost:8000/api/`
    pub url: String,
    /// Per-request timeout in seconds, also applied to token refresh.
    /// Default: 30
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file path. Default: `<data dir>/envmon/session.json`
    pub file: Option<PathBuf>,
}

impl ClientConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// Effective session file path.
    ///
    /// Falls back to the platform data directory, then the working directory.
    pub fn session_file(&self) -> PathBuf {
        self.session.file.clone().unwrap_or_else(|| {
            xdg_data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(SESSION_FILE)
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());

        if let Some(url) = get(API_URL_ENV) {
            self.server.url = url;
        }
        if let Some(raw) = get(TIMEOUT_ENV) {
            // Zero would fail every request, including the token refresh.
            self.server.timeout_secs = raw
                .parse()
                .ok()
                .filter(|secs: &u64| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidEnv {
                    var: TIMEOUT_ENV.to_string(),
                    value: raw.clone(),
                })?;
        }
        if let Some(file) = get(SESSION_FILE_ENV) {
            self.session.file = Some(PathBuf::from(file));
        }
        Ok(())
    }
}

/// Directory holding the user config file.
///
/// `ENVMON_CONFIG_DIR` wins over the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Directory holding persisted client state (session, logs).
pub fn xdg_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_NAME))
}

/// Load configuration: defaults, then the user config file if present,
/// then environment overrides.
pub fn load_config() -> Result<ClientConfig> {
    let mut config = match xdg_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!("Loading config from {}", path.display());
            load_config_file(&path)?
        }
        _ => ClientConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

/// Load a config file.
pub fn load_config_file(path: &Path) -> Result<ClientConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    ClientConfig::from_toml(&contents)
}

/// Save configuration to a file.
pub fn save_config(config: &ClientConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}
