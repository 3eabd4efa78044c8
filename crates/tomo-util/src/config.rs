//! Layered configuration.
//!
//! Sources, later wins:
//!
//! 1. Built-in defaults
//! 2. Global config file (`<config_dir>/tomo/config.json`)
//! 3. A config file named on the command line
//! 4. Environment overrides (`TOMO_URL`, `TOMO_TIMEOUT_MS`, `TOMO_LOG_LEVEL`,
//!    `TOMO_MIN_TOKEN_LENGTH`)

use crate::error::{ConfigError, ConfigResult};
use crate::log::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Server URL used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000/mcp";
/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Minimum access-token length used when none is configured.
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 10;
/// Privileged role used when none is configured.
pub const DEFAULT_ADMIN_ROLE: &str = "admin";

const CONFIG_FILE: &str = "config.json";

pub const ENV_URL: &str = "TOMO_URL";
pub const ENV_TIMEOUT_MS: &str = "TOMO_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "TOMO_LOG_LEVEL";
pub const ENV_MIN_TOKEN_LENGTH: &str = "TOMO_MIN_TOKEN_LENGTH";

/// tomo configuration. Unset fields fall back to the defaults above.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

/// Control-plane endpoint settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Authentication policy settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_token_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_role: Option<String>,
    /// Idle seconds before a forced logout. Unset or zero disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactivity_timeout_secs: Option<u64>,
}

impl ServerConfig {
    pub fn merge(mut self, other: Self) -> Self {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        self
    }
}

impl AuthConfig {
    pub fn merge(mut self, other: Self) -> Self {
        if other.min_token_length.is_some() {
            self.min_token_length = other.min_token_length;
        }
        if other.admin_role.is_some() {
            self.admin_role = other.admin_role;
        }
        if other.inactivity_timeout_secs.is_some() {
            self.inactivity_timeout_secs = other.inactivity_timeout_secs;
        }
        self
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Returns the merged config and the files that were read. A missing
    /// global file is skipped; a missing `explicit` file is an error.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<(Self, Vec<PathBuf>)> {
        Self::load_from(explicit, Self::global_config_dir().as_deref(), |name| {
            std::env::var(name).ok()
        })
    }

    /// [`Config::load`] with the global directory and environment supplied
    /// by the caller.
    pub fn load_from(
        explicit: Option<&Path>,
        global_dir: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<(Self, Vec<PathBuf>)> {
        let mut config = Self::default();
        let mut sources = Vec::new();

        if let Some(dir) = global_dir {
            let path = dir.join(CONFIG_FILE);
            if path.exists() {
                config = config.merge(Self::load_file(&path)?);
                sources.push(path);
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            config = config.merge(Self::load_file(path)?);
            sources.push(path.to_path_buf());
        }

        config = config.merge(Self::from_env(env)?);
        debug!(sources = sources.len(), "Loaded configuration");
        Ok((config, sources))
    }

    /// Read and parse one config file.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse config JSON. `origin` names the source in errors.
    pub fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::InvalidJson {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// The environment override layer.
    fn from_env(env: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();
        config.server.url = env(ENV_URL).filter(|v| !v.trim().is_empty());
        config.server.timeout_ms = parse_env(&env, ENV_TIMEOUT_MS)?;
        config.auth.min_token_length = parse_env(&env, ENV_MIN_TOKEN_LENGTH)?;
        if let Some(value) = env(ENV_LOG_LEVEL) {
            config.log_level = Some(LogLevel::parse(&value).ok_or(ConfigError::InvalidEnv {
                name: ENV_LOG_LEVEL.to_string(),
                value,
            })?);
        }
        Ok(config)
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.server = self.server.merge(other.server);
        self.auth = self.auth.merge(other.auth);
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        self
    }

    /// Get the global config directory.
    ///
    /// On Unix, prefers `~/.config/tomo` when it exists.
    pub fn global_config_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            if let Some(home) = dirs::home_dir() {
                let xdg_config = home.join(".config").join("tomo");
                if xdg_config.exists() {
                    return Some(xdg_config);
                }
            }
        }

        dirs::config_dir().map(|d| d.join("tomo"))
    }

    pub fn server_url(&self) -> &str {
        self.server.url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.server.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn min_token_length(&self) -> usize {
        self.auth.min_token_length.unwrap_or(DEFAULT_MIN_TOKEN_LENGTH)
    }

    pub fn admin_role(&self) -> &str {
        self.auth.admin_role.as_deref().unwrap_or(DEFAULT_ADMIN_ROLE)
    }

    /// `None` when the inactivity logout is disabled.
    pub fn inactivity_timeout(&self) -> Option<Duration> {
        self.auth
            .inactivity_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }
}

fn parse_env<T: FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> ConfigResult<Option<T>> {
    match env(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                name: name.to_string(),
                value,
            }),
    }
}
