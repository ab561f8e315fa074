//! Load-time error types.
//!
//! Only catalog and config loading can fail. Resolving an update for a
//! client never produces an error; bad input degrades to "no update".

use std::path::PathBuf;

use thiserror::Error;

use crate::version::VersionKeyError;

/// Result type alias for catalog loading.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while loading a release catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("channel {channel}: invalid version key {key:?}: {source}")]
    InvalidKey {
        channel: String,
        key: String,
        #[source]
        source: VersionKeyError,
    },

    #[error("channel {channel}, bucket {bucket}: invalid rollout threshold {threshold:?} (expected 0-100)")]
    InvalidThreshold {
        channel: String,
        bucket: String,
        threshold: String,
    },

    #[error("channel {channel}: malformed entry: {message}")]
    Entry { channel: String, message: String },
}

/// Result type alias for daemon configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading the daemon configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("release_url_template must contain {{version}}: {0}")]
    UrlTemplate(String),
}
