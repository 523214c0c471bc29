//! Configuration loading for the relay.
//! Secrets and the port come from the environment (optionally via `.env`);
//! the model table and upstream settings come from trivia.toml or the path
//! in the TRIVIA_CONFIG env var, falling back to built-in defaults.

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{default_profiles, ModelList, ModelProfile};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const PORT_VAR: &str = "PORT";
pub const CONFIG_PATH_VAR: &str = "TRIVIA_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "trivia.toml";

/// File-level settings. Every field has a default so a partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,
    #[serde(default = "default_profiles")]
    pub models: Vec<ModelProfile>,
}

fn default_host()              -> String { "0.0.0.0".to_string() }
fn default_timeout_secs()      -> u64    { 30 }
fn default_upstream_base_url() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_port()              -> u16    { 3000 }

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            timeout_secs: default_timeout_secs(),
            upstream_base_url: default_upstream_base_url(),
            models: default_profiles(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }
}

/// Everything the process needs, resolved once at startup and passed down explicitly.
#[derive(Debug)]
pub struct RelayConfig {
    pub api_key: SecretString,
    pub port: u16,
    pub settings: Settings,
    pub models: ModelList,
}

impl RelayConfig {
    /// Load from the process environment. Reads `.env` first when present.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey(API_KEY_VAR))?;

        let port = match lookup(PORT_VAR).filter(|p| !p.trim().is_empty()) {
            Some(raw) => parse_port(&raw)?,
            None => default_port(),
        };

        let settings = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Settings::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Settings::from_file(DEFAULT_CONFIG_FILE)?,
            None => Settings::default(),
        };

        if settings.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(settings.timeout_secs));
        }

        let models = ModelList::new(settings.models.clone())?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            port,
            settings,
            models,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.settings.host, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs)
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidPort(raw.to_string())),
        Ok(port) => Ok(port),
    }
}
