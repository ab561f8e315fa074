//! Version key resolver — picks the catalog bucket for a client.
//!
//! Step channels probe the step table with the client's version from
//! most to least specific (`8.0.7.1`, `8.0.7`, `8.0`, `8`); the first key
//! present wins. A catalog can therefore force clients through mandatory
//! intermediate releases: `8.0.7` may point at `8.0.7.1` while the
//! coarser `8.0` bucket points at `8.0.10`.
//!
//! The daily channel skips the step table. Clients whose build is newer
//! than the freshness window get nothing; older ones are matched to a
//! snapshot by `major.minor`, then `major`, then `major.0`.

use chrono::TimeDelta;
use tracing::debug;

use updater_core::{
    Channel, ClientDescriptor, ReleaseCatalog, RolloutTierSet, SnapshotEntry, VersionKey,
};

use crate::clock::Clock;

/// Which bucket, if any, applies to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    NoUpdate,
    Step {
        /// The client's own version.
        current: VersionKey,
        /// The step-table key that matched.
        bucket: VersionKey,
        tiers: &'a RolloutTierSet,
    },
    Snapshot {
        bucket: VersionKey,
        entry: &'a SnapshotEntry,
    },
}

/// Resolve the bucket for `descriptor` against `catalog`.
pub fn resolve<'a>(
    descriptor: &ClientDescriptor,
    catalog: &'a ReleaseCatalog,
    clock: &dyn Clock,
    daily_freshness: TimeDelta,
) -> Resolution<'a> {
    let Some(channel) = descriptor.channel() else {
        debug!(channel = %descriptor.channel, "unrecognized channel");
        return Resolution::NoUpdate;
    };
    match channel {
        Channel::Daily => resolve_daily(descriptor, catalog, clock, daily_freshness),
        step_channel => resolve_step(step_channel, descriptor, catalog),
    }
}

fn resolve_step<'a>(
    channel: Channel,
    descriptor: &ClientDescriptor,
    catalog: &'a ReleaseCatalog,
) -> Resolution<'a> {
    let Some(current) = descriptor.current_version() else {
        debug!(%channel, major = %descriptor.major_version, "no usable client version");
        return Resolution::NoUpdate;
    };
    let Some(table) = catalog.step_table(channel) else {
        debug!(%channel, "channel has no step table");
        return Resolution::NoUpdate;
    };

    for probe in current.prefixes() {
        if let Some(tiers) = table.get(&probe) {
            debug!(%channel, version = %current, bucket = %probe, "resolved step bucket");
            return Resolution::Step {
                current,
                bucket: probe,
                tiers,
            };
        }
    }

    debug!(%channel, version = %current, "no step bucket matches");
    Resolution::NoUpdate
}

fn resolve_daily<'a>(
    descriptor: &ClientDescriptor,
    catalog: &'a ReleaseCatalog,
    clock: &dyn Clock,
    daily_freshness: TimeDelta,
) -> Resolution<'a> {
    let Some(built) = descriptor.build_timestamp else {
        debug!("daily client sent no readable build timestamp");
        return Resolution::NoUpdate;
    };
    let age = clock.now() - built;
    if age <= daily_freshness {
        debug!(%built, age_hours = age.num_hours(), "daily build is current");
        return Resolution::NoUpdate;
    }

    let Some(major) = VersionKey::from_reported(&[&descriptor.major_version]) else {
        debug!(major = %descriptor.major_version, "no usable daily client version");
        return Resolution::NoUpdate;
    };
    let Some(table) = catalog.snapshot_table() else {
        debug!("catalog has no daily snapshots");
        return Resolution::NoUpdate;
    };

    let major_minor = VersionKey::from_reported(&[
        &descriptor.major_version,
        &descriptor.minor_version,
    ])
    .filter(|key| key.len() == 2);
    let major_zero = VersionKey::new(&[major.major(), 0]);

    for probe in [major_minor, Some(major), major_zero].into_iter().flatten() {
        if let Some(entry) = table.get(&probe) {
            debug!(%built, bucket = %probe, "outdated daily build, offering snapshot");
            return Resolution::Snapshot {
                bucket: probe,
                entry,
            };
        }
    }

    debug!(major = %major, "no daily snapshot for this series");
    Resolution::NoUpdate
}
