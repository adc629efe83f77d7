//! Configuration management for pros.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `pros.toml` file
//! 3. User config `~/.config/pros/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The config file is not valid TOML for [`Config`].
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Installed apps and where their declarations live.
    pub project: ProjectConfig,

    /// Graph database connection.
    pub database: DatabaseConfig,

    /// HTTP server settings.
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./pros.toml` (project local)
    /// 2. `~/.config/pros/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(PROJECT_CONFIG_FILE).exists() {
            return Self::from_file(PROJECT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Apply `PROS_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        // Project overrides
        if let Some(apps) = lookup("PROS_INSTALLED_APPS") {
            self.project.installed_apps = apps
                .split(',')
                .map(str::trim)
                .filter(|app| !app.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(dir) = lookup("PROS_APPS_DIR") {
            self.project.apps_dir = dir;
        }

        // Database overrides
        if let Some(url) = lookup("PROS_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(name) = lookup("PROS_DATABASE_NAME") {
            self.database.database = name;
        }
        if let Some(user) = lookup("PROS_DATABASE_USER") {
            self.database.username = user;
        }
        if let Some(password) = lookup("PROS_DATABASE_PASSWORD") {
            self.database.password = password;
        }

        // Server overrides
        if let Some(host) = lookup("PROS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PROS_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PROS_SERVER_PORT".to_string(),
                value: port.clone(),
            })?;
        }

        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,

    /// App names, in the order their declarations are loaded.
    pub installed_apps: Vec<String>,

    /// Directory holding one subdirectory per app.
    pub apps_dir: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            installed_apps: Vec::new(),
            apps_dir: DEFAULT_APPS_DIR.to_string(),
        }
    }
}

impl ProjectConfig {
    /// Directory of one installed app.
    pub fn app_path(&self, app: &str) -> PathBuf {
        PathBuf::from(&self.apps_dir).join(app)
    }
}

/// Graph database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// HTTP base URL of the Neo4j server.
    pub url: String,

    pub database: String,

    pub username: String,

    /// Password (can also be set via `PROS_DATABASE_PASSWORD`).
    #[serde(skip_serializing)]
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            database: DEFAULT_DATABASE_NAME.to_string(),
            username: DEFAULT_DATABASE_USER.to_string(),
            password: String::new(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
