//! updaterd.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// How long a daily build counts as current before clients are offered
/// the newest snapshot.
pub const DEFAULT_DAILY_FRESHNESS_DAYS: u32 = 30;

/// Conventional release archive location; `{version}` is replaced with
/// the target version.
pub const DEFAULT_RELEASE_URL_TEMPLATE: &str =
    "https://download.nextcloud.com/server/releases/nextcloud-{version}.zip";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ListenConfig,
    pub catalog: CatalogConfig,
    pub rollout: RolloutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("releases.toml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    pub daily_freshness_days: u32,
    pub release_url_template: String,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            daily_freshness_days: DEFAULT_DAILY_FRESHNESS_DAYS,
            release_url_template: DEFAULT_RELEASE_URL_TEMPLATE.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        // A relative catalog path is relative to the config file.
        if config.catalog.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.catalog.path = dir.join(&config.catalog.path);
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: ServerConfig = toml::from_str(content)?;
        if !config.rollout.release_url_template.contains("{version}") {
            return Err(ConfigError::UrlTemplate(
                config.rollout.release_url_template,
            ));
        }
        Ok(config)
    }
}
