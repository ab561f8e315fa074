//! Shared types used across the update server crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::VersionKey;

/// A named release track with its own catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Production,
    Stable,
    Beta,
    /// Nightly snapshots, gated on build age instead of rollout tiers.
    Daily,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Production,
        Channel::Stable,
        Channel::Beta,
        Channel::Daily,
    ];

    /// Parse a channel tag. Empty and unrecognized tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "production" => Some(Channel::Production),
            "stable" => Some(Channel::Stable),
            "beta" => Some(Channel::Beta),
            "daily" => Some(Channel::Daily),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Production => "production",
            Channel::Stable => "stable",
            Channel::Beta => "beta",
            Channel::Daily => "daily",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a client reports about itself when asking for an update.
///
/// All string fields use the empty string for "not reported".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDescriptor {
    pub channel: String,
    pub major_version: String,
    pub minor_version: String,
    pub maintenance_version: String,
    pub revision_version: String,
    /// Only meaningful on the daily channel.
    pub build_timestamp: Option<DateTime<Utc>>,
    /// Opaque rollout seed, usually the installation mtime.
    pub installation_age_token: String,
    pub php_major_version: String,
    pub php_minor_version: String,
    pub php_release_version: String,
}

impl ClientDescriptor {
    pub fn channel(&self) -> Option<Channel> {
        Channel::parse(&self.channel)
    }

    /// Most specific version key the client reported, or `None` when the
    /// major version is missing or malformed.
    pub fn current_version(&self) -> Option<VersionKey> {
        VersionKey::from_reported(&[
            &self.major_version,
            &self.minor_version,
            &self.maintenance_version,
            &self.revision_version,
        ])
    }

    /// The PHP runtime version, or `None` when not reported.
    pub fn php_version(&self) -> Option<VersionKey> {
        VersionKey::from_reported(&[
            &self.php_major_version,
            &self.php_minor_version,
            &self.php_release_version,
        ])
    }
}
