//! Update engine — turns a client descriptor into an update decision.
//!
//! The engine wires the resolver and selector together with the
//! injected clock and percentile source, then builds the manifest the
//! client receives. It holds no mutable state; one engine serves every
//! request.

use std::sync::Arc;

use chrono::TimeDelta;
use tracing::info;

use updater_core::config::{
    DEFAULT_DAILY_FRESHNESS_DAYS, DEFAULT_RELEASE_URL_TEMPLATE, RolloutConfig,
};
use updater_core::{
    ClientDescriptor, ReleaseCatalog, ReleaseEntry, SnapshotEntry, UpdateDecision,
    UpdateManifest, VersionKey,
};

use crate::clock::{Clock, SystemClock};
use crate::percentile::{InstallationAgePercentile, RolloutPercentile};
use crate::resolver::{self, Resolution};
use crate::selector;

/// Version reported for daily snapshots; newer than any real release.
pub const DAILY_SENTINEL_VERSION: VersionKey = VersionKey::from_parts([100, 0, 0, 0]);

/// Human label reported for daily snapshots.
pub const DAILY_LABEL: &str = "daily";

/// Tunables for resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct EnginePolicy {
    /// Daily builds younger than this are considered current.
    pub daily_freshness: TimeDelta,
    /// Archive URL convention; `{version}` is replaced with the target.
    pub release_url_template: String,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            daily_freshness: TimeDelta::days(i64::from(DEFAULT_DAILY_FRESHNESS_DAYS)),
            release_url_template: DEFAULT_RELEASE_URL_TEMPLATE.to_string(),
        }
    }
}

impl From<&RolloutConfig> for EnginePolicy {
    fn from(cfg: &RolloutConfig) -> Self {
        Self {
            daily_freshness: TimeDelta::days(i64::from(cfg.daily_freshness_days)),
            release_url_template: cfg.release_url_template.clone(),
        }
    }
}

impl EnginePolicy {
    /// Conventional download URL for a release.
    pub fn release_url(&self, version: &VersionKey) -> String {
        self.release_url_template
            .replace("{version}", &version.to_string())
    }
}

/// Decides whether a client should update, and to what.
#[derive(Clone)]
pub struct UpdateEngine {
    policy: EnginePolicy,
    clock: Arc<dyn Clock>,
    percentile: Arc<dyn RolloutPercentile>,
}

impl UpdateEngine {
    /// Engine using the system clock and installation-age bucketing.
    pub fn new(policy: EnginePolicy) -> Self {
        Self {
            policy,
            clock: Arc::new(SystemClock),
            percentile: Arc::new(InstallationAgePercentile),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_percentile(mut self, percentile: Arc<dyn RolloutPercentile>) -> Self {
        self.percentile = percentile;
        self
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Decide the update for one client against one catalog snapshot.
    pub fn decide(&self, descriptor: &ClientDescriptor, catalog: &ReleaseCatalog) -> UpdateDecision {
        let resolution = resolver::resolve(
            descriptor,
            catalog,
            self.clock.as_ref(),
            self.policy.daily_freshness,
        );

        let manifest = match resolution {
            Resolution::NoUpdate => return UpdateDecision::NoUpdate,
            Resolution::Snapshot { entry, .. } => self.daily_manifest(entry),
            Resolution::Step {
                current, tiers, ..
            } => {
                match selector::select(tiers, descriptor, &current, self.percentile.as_ref()) {
                    Some(entry) => self.release_manifest(entry),
                    None => return UpdateDecision::NoUpdate,
                }
            }
        };

        info!(
            channel = %descriptor.channel,
            target = %manifest.version,
            label = %manifest.label,
            "offering update"
        );
        UpdateDecision::Update(manifest)
    }

    fn release_manifest(&self, entry: &ReleaseEntry) -> UpdateManifest {
        let url = entry
            .download_url
            .clone()
            .unwrap_or_else(|| self.policy.release_url(&entry.latest_version));
        UpdateManifest {
            version: entry.latest_version,
            label: entry.latest_version.to_string(),
            url,
            web: entry.web.clone(),
            autoupdater: entry.autoupdater_enabled,
            signature: entry.signature.clone(),
        }
    }

    fn daily_manifest(&self, entry: &SnapshotEntry) -> UpdateManifest {
        UpdateManifest {
            version: DAILY_SENTINEL_VERSION,
            label: DAILY_LABEL.to_string(),
            url: entry.download_url.clone(),
            web: entry.web.clone(),
            autoupdater: true,
            signature: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    const PRODUCTION: &str = r#"
[production."11.0"]
latest = "11.0.1"
web = "https://docs.nextcloud.com/server/11/admin_manual/maintenance/upgrade.html"
signature = "MySignature"

[production."8.2"]
latest = "8.2.2"
web = "https://doc.owncloud.org/server/8.2/admin_manual/maintenance/upgrade.html"

[production."8.1"]
latest = "8.1.5"
web = "https://doc.owncloud.org/server/8.1/admin_manual/maintenance/upgrade.html"

[production."8.0"]
latest = "8.0.10"
web = "https://doc.owncloud.org/server/8.0/admin_manual/maintenance/upgrade.html"

[production."8.0.7"]
latest = "8.0.7.1"
web = "https://doc.owncloud.org/server/8.0/admin_manual/maintenance/upgrade.html"

[production."8.0.7.1"]
latest = "8.0.8"
web = "https://doc.owncloud.org/server/8.0/admin_manual/maintenance/upgrade.html"

[production."8.0.8"]
latest = "8.0.9"
web = "https://doc.owncloud.org/server/8.0/admin_manual/maintenance/upgrade.html"

[production."7"]
latest = "7.0.12"
web = "https://doc.owncloud.org/server/8.0/admin_manual/maintenance/upgrade.html"

[production."6"]
latest = "7.0.12"
web = "https://doc.owncloud.org/server/8.0/admin_manual/maintenance/upgrade.html"
downloadUrl = "https://downloads.owncloud.com/foo.zip"

[daily."6"]
download_url = "https://download.owncloud.org/community/owncloud-7.0.13.zip"
web = "https://doc.owncloud.org/server/7.0/admin_manual/maintenance/upgrade.html"
"#;

    fn engine() -> UpdateEngine {
        UpdateEngine::new(EnginePolicy::default()).with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2016, 6, 1, 0, 0, 0).unwrap(),
        )))
    }

    fn catalog() -> ReleaseCatalog {
        ReleaseCatalog::from_toml_str(PRODUCTION).unwrap()
    }

    fn client(version: &str) -> ClientDescriptor {
        let parts: Vec<&str> = version.split('.').collect();
        let part = |i: usize| parts.get(i).copied().unwrap_or_default().to_string();
        ClientDescriptor {
            channel: "production".into(),
            major_version: part(0),
            minor_version: part(1),
            maintenance_version: part(2),
            revision_version: part(3),
            ..Default::default()
        }
    }

    fn target(version: &str) -> Option<String> {
        engine()
            .decide(&client(version), &catalog())
            .manifest()
            .map(|m| m.version.to_string())
    }

    #[test]
    fn conventional_download_url() {
        let decision = engine().decide(&client("8.0.8"), &catalog());
        let manifest = decision.manifest().unwrap();
        assert_eq!(manifest.version.to_string(), "8.0.9");
        assert_eq!(
            manifest.url,
            "https://download.nextcloud.com/server/releases/nextcloud-8.0.9.zip"
        );
        assert!(manifest.autoupdater);
        assert_eq!(manifest.signature, None);
    }

    #[test]
    fn explicit_download_url_is_verbatim() {
        let decision = engine().decide(&client("6.0.5"), &catalog());
        let manifest = decision.manifest().unwrap();
        assert_eq!(manifest.version.to_string(), "7.0.12");
        assert_eq!(manifest.url, "https://downloads.owncloud.com/foo.zip");
    }

    #[test]
    fn web_link_passes_through_across_series() {
        let decision = engine().decide(&client("7.0.11"), &catalog());
        let manifest = decision.manifest().unwrap();
        assert_eq!(manifest.version.to_string(), "7.0.12");
        assert!(manifest.web.contains("/server/8.0/"));
    }

    #[test]
    fn signature_passes_through() {
        let decision = engine().decide(&client("11.0.0"), &catalog());
        assert_eq!(
            decision.manifest().unwrap().signature.as_deref(),
            Some("MySignature")
        );
    }

    #[test]
    fn terminal_versions_get_nothing() {
        for version in ["8.0.10", "8.0.11", "8.1.5", "8.2.3", "8.3.3", "7.0.13", ""] {
            assert_eq!(target(version), None, "{version} should get no update");
        }
    }

    #[test]
    fn terminus_is_idempotent() {
        let engine = engine();
        let catalog = catalog();
        for _ in 0..3 {
            assert_eq!(
                engine.decide(&client("8.0.10"), &catalog),
                UpdateDecision::NoUpdate
            );
        }
    }

    #[test]
    fn upgrade_chain_is_monotonic_and_terminates() {
        let engine = engine();
        let catalog = catalog();
        let mut current: VersionKey = "8.0.7".parse().unwrap();
        let mut hops = Vec::new();
        while let UpdateDecision::Update(manifest) =
            engine.decide(&client(&current.to_string()), &catalog)
        {
            assert!(manifest.version.is_newer_than(&current));
            current = manifest.version;
            hops.push(current.to_string());
            assert!(hops.len() < 10, "chain did not terminate: {hops:?}");
        }
        assert_eq!(hops, ["8.0.7.1", "8.0.8", "8.0.9", "8.0.10"]);
    }

    #[test]
    fn daily_snapshot_manifest() {
        let descriptor = ClientDescriptor {
            channel: "daily".into(),
            major_version: "6".into(),
            build_timestamp: Some(Utc.with_ymd_and_hms(2006, 6, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let decision = engine().decide(&descriptor, &catalog());
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<nextcloud>
 <version>100.0.0.0</version>
 <versionstring>Nextcloud daily</versionstring>
 <url>https://download.owncloud.org/community/owncloud-7.0.13.zip</url>
 <web>https://doc.owncloud.org/server/7.0/admin_manual/maintenance/upgrade.html</web>
 <autoupdater>1</autoupdater>
</nextcloud>
"#;
        assert_eq!(decision.render(), expected);
    }

    #[test]
    fn policy_from_config() {
        let cfg = RolloutConfig {
            daily_freshness_days: 2,
            release_url_template: "https://mirror.example.org/nc-{version}.tar.bz2".to_string(),
        };
        let policy = EnginePolicy::from(&cfg);
        assert_eq!(policy.daily_freshness, TimeDelta::days(2));
        assert_eq!(
            policy.release_url(&"9.0.1".parse().unwrap()),
            "https://mirror.example.org/nc-9.0.1.tar.bz2"
        );
    }
}
