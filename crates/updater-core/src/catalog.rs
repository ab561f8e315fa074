//! Release catalog: per-channel step tables and daily snapshot tables.
//!
//! The catalog file is TOML. Each top-level table is a channel. The
//! `daily` channel maps `major.minor` keys to snapshot pointers; every
//! other channel maps a current version key to the next upgrade hop,
//! either as one unconditional entry or as rollout tiers keyed by a
//! percentage threshold:
//!
//! ```toml
//! [production."8.0.7"]
//! latest = "8.0.7.1"
//! web = "https://doc.example.org/8.0/upgrade.html"
//!
//! [production."8.2".95]
//! latest = "8.2.2"
//! web = "https://doc.example.org/8.2/upgrade.html"
//! min_php_version = "5.4"
//!
//! [daily."9.0"]
//! download_url = "https://download.example.org/daily-master.zip"
//! web = "https://doc.example.org/9.0/upgrade.html"
//! ```
//!
//! The table shape is decided here, by channel name, so the resolver
//! only ever sees typed [`StepTable`]s and [`SnapshotTable`]s.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::types::Channel;
use crate::version::VersionKey;

/// Upper bound of a rollout threshold (everyone).
pub const FULL_ROLLOUT: u8 = 100;

fn default_autoupdater() -> bool {
    true
}

/// A release a client may be pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseEntry {
    #[serde(rename = "latest")]
    pub latest_version: VersionKey,
    pub web: String,
    /// Overrides the conventional release archive URL.
    #[serde(default, alias = "downloadUrl", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(rename = "autoupdater", default = "default_autoupdater")]
    pub autoupdater_enabled: bool,
    #[serde(default, alias = "minPHPVersion", skip_serializing_if = "Option::is_none")]
    pub min_php_version: Option<VersionKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// One threshold-gated slice of a staged rollout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutTier {
    /// 0-100, higher reaches more of the population.
    pub threshold: u8,
    pub entry: ReleaseEntry,
}

/// The candidate entries for one step bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutTierSet {
    /// A single entry offered to every client.
    Unconditional(ReleaseEntry),
    /// Threshold tiers, ordered from highest threshold to lowest.
    Staged(Vec<RolloutTier>),
}

impl RolloutTierSet {
    /// Build a staged set, ordering tiers from highest threshold down.
    pub fn staged(mut tiers: Vec<RolloutTier>) -> Self {
        tiers.sort_by(|a, b| b.threshold.cmp(&a.threshold));
        RolloutTierSet::Staged(tiers)
    }

    /// All entries in walk order.
    pub fn entries(&self) -> Vec<&ReleaseEntry> {
        match self {
            RolloutTierSet::Unconditional(entry) => vec![entry],
            RolloutTierSet::Staged(tiers) => tiers.iter().map(|t| &t.entry).collect(),
        }
    }
}

/// Maps a client's current version key to its next upgrade hop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepTable {
    buckets: BTreeMap<VersionKey, RolloutTierSet>,
}

impl StepTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: VersionKey, tiers: RolloutTierSet) {
        self.buckets.insert(key, tiers);
    }

    pub fn get(&self, key: &VersionKey) -> Option<&RolloutTierSet> {
        self.buckets.get(key)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VersionKey, &RolloutTierSet)> {
        self.buckets.iter()
    }
}

/// A daily-channel release pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotEntry {
    #[serde(alias = "downloadUrl")]
    pub download_url: String,
    pub web: String,
}

/// Maps `major.minor` keys to daily snapshot pointers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotTable {
    entries: BTreeMap<VersionKey, SnapshotEntry>,
}

impl SnapshotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: VersionKey, entry: SnapshotEntry) {
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &VersionKey) -> Option<&SnapshotEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Borrowed view of one channel's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCatalog<'a> {
    Step(&'a StepTable),
    Snapshot(&'a SnapshotTable),
}

/// All channels' release tables. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseCatalog {
    steps: BTreeMap<Channel, StepTable>,
    daily: Option<SnapshotTable>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBucket {
    Single(ReleaseEntry),
    Tiered(BTreeMap<String, ReleaseEntry>),
}

impl ReleaseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the step table for a non-daily channel.
    ///
    /// The daily channel only ever carries a snapshot table; use
    /// [`ReleaseCatalog::set_daily`] for it.
    pub fn set_steps(&mut self, channel: Channel, table: StepTable) {
        if channel != Channel::Daily {
            self.steps.insert(channel, table);
        }
    }

    pub fn set_daily(&mut self, table: SnapshotTable) {
        self.daily = Some(table);
    }

    /// The table for `channel`, if the catalog defines one.
    pub fn get(&self, channel: Channel) -> Option<ChannelCatalog<'_>> {
        match channel {
            Channel::Daily => self.daily.as_ref().map(ChannelCatalog::Snapshot),
            other => self.steps.get(&other).map(ChannelCatalog::Step),
        }
    }

    pub fn step_table(&self, channel: Channel) -> Option<&StepTable> {
        self.steps.get(&channel)
    }

    pub fn snapshot_table(&self) -> Option<&SnapshotTable> {
        self.daily.as_ref()
    }

    /// Channels defined in this catalog.
    pub fn channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_some())
            .collect()
    }

    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&content)?;
        debug!(path = ?path, channels = ?catalog.channels(), "release catalog loaded");
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> CatalogResult<Self> {
        let raw: BTreeMap<String, toml::Value> = toml::from_str(content)?;
        let mut catalog = Self::new();
        for (name, value) in raw {
            let channel =
                Channel::parse(&name).ok_or_else(|| CatalogError::UnknownChannel(name.clone()))?;
            if channel == Channel::Daily {
                catalog.set_daily(parse_snapshot_table(&name, value)?);
            } else {
                catalog.set_steps(channel, parse_step_table(&name, value)?);
            }
        }
        Ok(catalog)
    }
}

fn parse_key(channel: &str, key: &str) -> CatalogResult<VersionKey> {
    key.parse().map_err(|source| CatalogError::InvalidKey {
        channel: channel.to_string(),
        key: key.to_string(),
        source,
    })
}

fn entry_error(channel: &str, err: toml::de::Error) -> CatalogError {
    CatalogError::Entry {
        channel: channel.to_string(),
        message: err.message().to_string(),
    }
}

fn parse_snapshot_table(channel: &str, value: toml::Value) -> CatalogResult<SnapshotTable> {
    let raw: BTreeMap<String, SnapshotEntry> =
        value.try_into().map_err(|e| entry_error(channel, e))?;
    let mut table = SnapshotTable::new();
    for (key, entry) in raw {
        table.insert(parse_key(channel, &key)?, entry);
    }
    Ok(table)
}

fn parse_step_table(channel: &str, value: toml::Value) -> CatalogResult<StepTable> {
    let raw: BTreeMap<String, RawBucket> =
        value.try_into().map_err(|e| entry_error(channel, e))?;
    let mut table = StepTable::new();
    for (key, bucket) in raw {
        let version = parse_key(channel, &key)?;
        let tiers = match bucket {
            RawBucket::Single(entry) => RolloutTierSet::Unconditional(entry),
            RawBucket::Tiered(tiers) => {
                let mut staged = Vec::with_capacity(tiers.len());
                for (threshold, entry) in tiers {
                    let parsed = threshold
                        .parse::<u8>()
                        .ok()
                        .filter(|t| *t <= FULL_ROLLOUT)
                        .ok_or_else(|| CatalogError::InvalidThreshold {
                            channel: channel.to_string(),
                            bucket: key.clone(),
                            threshold: threshold.clone(),
                        })?;
                    staged.push(RolloutTier {
                        threshold: parsed,
                        entry,
                    });
                }
                RolloutTierSet::staged(staged)
            }
        };
        table.insert(version, tiers);
    }
    Ok(table)
}
