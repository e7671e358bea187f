//! Settings file: engine tuning plus the HTTP listener.
//!
//! Settings are TOML with an `[engine]` and a `[server]` table. Every key is
//! optional. A few `ORTHO_*` environment variables override the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::error::ConfigError;

/// Environment variable naming a settings file for the server.
pub const ENV_CONFIG: &str = "ORTHO_CONFIG";
/// Environment variable overriding [`ServerConfig::bind`].
pub const ENV_BIND: &str = "ORTHO_SERVER_BIND";
/// Environment variable overriding [`ServerConfig::port`].
pub const ENV_PORT: &str = "ORTHO_SERVER_PORT";
/// Environment variable overriding [`EngineConfig::workers`].
pub const ENV_WORKERS: &str = "ORTHO_WORKERS";

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    30001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `bind:port`, ready for a listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Everything read from a settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Settings {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let settings: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        settings.engine.validate()?;
        Ok(settings)
    }

    /// Load from `path` if given, defaults otherwise, then apply the
    /// environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.with_env_overrides()
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Apply `ORTHO_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_PORT.into(),
                message: format!("`{port}` is not a port number"),
            })?;
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            self.engine.workers = workers.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_WORKERS.into(),
                message: format!("`{workers}` is not a worker count"),
            })?;
        }
        self.engine.validate()?;
        Ok(self)
    }
}
