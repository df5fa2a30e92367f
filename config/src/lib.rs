//! Configuration for the Sage connector, read from `~/.sage/config.toml`.

use std::path::{Path, PathBuf};
use std::{env, fs};

use sage_types::{AnalysisDepth, DEFAULT_SERVER_URL};
use serde::Deserialize;

/// Overrides `connector.server_url` when set and non-empty.
pub const SERVER_URL_ENV: &str = "SAGE_SERVER_URL";

const fn default_true() -> bool {
    true
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SageConfig {
    pub connector: ConnectorConfig,
    pub analysis: AnalysisConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectorConfig {
    /// Backend address, `tcp://host:port`. `${VAR}` references are expanded.
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub depth: AnalysisDepth,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotificationsConfig {
    /// Report connection status changes to the user.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl SageConfig {
    /// Load the user config. `Ok(None)` when there is no home directory or no
    /// file; callers fall back to [`SageConfig::default`].
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// User config with the environment applied. Read and parse failures are
    /// logged and fall back to defaults.
    #[must_use]
    pub fn load_or_default() -> Self {
        let config = match Self::load() {
            Ok(config) => config.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("Using default config: {err}");
                Self::default()
            }
        };
        config.resolve(|name| env::var(name).ok())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Expand `${VAR}` references and apply the [`SERVER_URL_ENV`] override.
    #[must_use]
    pub fn resolve<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.connector.server_url = expand_vars(&self.connector.server_url, &lookup);
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|url| !url.trim().is_empty()) {
            tracing::debug!(server_url = %url, "Server address overridden by {SERVER_URL_ENV}");
            self.connector.server_url = url;
        }
        self
    }
}

/// Replace `${NAME}` with `lookup(NAME)`; unknown names become empty and an
/// unterminated `${` is kept verbatim.
pub fn expand_vars<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + 2 + len];
        if !name.is_empty() {
            out.push_str(&lookup(name).unwrap_or_default());
        }
        rest = &rest[start + 3 + len..];
    }
    out.push_str(rest);
    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".sage").join("config.toml"))
}
