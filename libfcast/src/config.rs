//! Configuration management for fcast
//!
//! Settings come from a TOML file; a handful of environment variables
//! override the file so scripts and agents can run without one.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::guards::RateConfig;
use crate::state::DEFAULT_HISTORY_SIZE;

pub const CONFIG_ENV: &str = "FCAST_CONFIG";
pub const STATE_PATH_ENV: &str = "FARCASTER_STATE_PATH";
pub const API_KEY_ENV: &str = "NEYNAR_API_KEY";
pub const FID_ENV: &str = "FARCASTER_FID";
pub const SIGNER_KEY_ENV: &str = "SIGNER_KEY_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub state: StateConfig,
    pub guards: GuardsConfig,
    pub hub: HubConfig,
    pub signer: SignerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub path: Option<String>,
    pub history_size: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: None,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardsConfig {
    pub enabled: bool,
    pub max_per_hour: usize,
    pub min_interval_ms: u64,
}

impl Default for GuardsConfig {
    fn default() -> Self {
        let rate = RateConfig::default();
        Self {
            enabled: true,
            max_per_hour: rate.max_per_hour,
            min_interval_ms: rate.min_interval_ms,
        }
    }
}

impl GuardsConfig {
    pub fn rate_config(&self) -> RateConfig {
        RateConfig {
            max_per_hour: self.max_per_hour,
            min_interval_ms: self.min_interval_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Base URL for read queries.
    pub api_url: String,
    /// Endpoint accepting signed messages.
    pub submit_url: String,
    pub query_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    pub api_key_file: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.neynar.com/v2/farcaster".to_string(),
            submit_url: "https://hub-api.neynar.com/v1/submitMessage".to_string(),
            query_timeout_secs: 15,
            submit_timeout_secs: 10,
            api_key_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    pub key_file: Option<String>,
    pub fid: Option<u64>,
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error; built-in defaults apply.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Some(path) = env_nonempty(CONFIG_ENV) {
        return Ok(expand(&path));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("fcast").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("fcast"))
}

/// State file location: explicit option, then `FARCASTER_STATE_PATH`, then
/// the config file, then the data directory.
pub fn resolve_state_path(explicit: Option<&str>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(path));
    }
    if let Some(path) = env_nonempty(STATE_PATH_ENV) {
        return Ok(expand(&path));
    }
    if let Some(ref path) = config.state.path {
        return Ok(expand(path));
    }
    Ok(resolve_data_path()?.join("state.json"))
}

/// Signer key file: `SIGNER_KEY_PATH`, then the config file, then
/// `<config_dir>/fcast/signer.json`.
pub fn resolve_signer_key_path(config: &Config) -> Result<PathBuf> {
    if let Some(path) = env_nonempty(SIGNER_KEY_ENV) {
        return Ok(expand(&path));
    }
    if let Some(ref path) = config.signer.key_file {
        return Ok(expand(path));
    }
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;
    Ok(config_dir.join("fcast").join("signer.json"))
}

/// FID override from `FARCASTER_FID` or the config file. The signer key
/// file supplies the fallback.
pub fn resolve_fid(config: &Config) -> Option<u64> {
    env_nonempty(FID_ENV)
        .and_then(|v| v.trim().parse().ok())
        .or(config.signer.fid)
}

/// API key from `NEYNAR_API_KEY`, else the key file named in the config.
pub fn resolve_api_key(config: &Config) -> Result<SecretString> {
    if let Some(key) = env_nonempty(API_KEY_ENV) {
        return Ok(SecretString::from(key.trim().to_string()));
    }

    if let Some(ref file) = config.hub.api_key_file {
        let content = std::fs::read_to_string(expand(file)).map_err(ConfigError::ReadError)?;
        let key = content.trim();
        if !key.is_empty() {
            return Ok(SecretString::from(key.to_string()));
        }
    }

    Err(ConfigError::MissingField(format!(
        "hub API key (set {} or hub.api_key_file)",
        API_KEY_ENV
    ))
    .into())
}
