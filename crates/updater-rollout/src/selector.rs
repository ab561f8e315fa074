//! Rollout & eligibility selector — picks one entry from a step bucket.
//!
//! Staged tiers partition the population: with thresholds `95` and `5`,
//! percentiles `[0, 5)` land on the `5` tier and `[5, 95)` on the `95`
//! tier. Clients at or above the highest threshold are not part of the
//! rollout yet. Clients without a seed start at the highest tier.
//!
//! Starting from the client's tier, the walk moves down to lower
//! thresholds until an entry passes the PHP gate.

use tracing::debug;

use updater_core::{ClientDescriptor, ReleaseEntry, RolloutTier, RolloutTierSet, VersionKey};

use crate::percentile::RolloutPercentile;

/// Pick the entry `descriptor` should move to, or `None` for "no update".
pub fn select<'a>(
    tiers: &'a RolloutTierSet,
    descriptor: &ClientDescriptor,
    current: &VersionKey,
    percentile: &dyn RolloutPercentile,
) -> Option<&'a ReleaseEntry> {
    let php = descriptor.php_version();

    let entry = match tiers {
        RolloutTierSet::Unconditional(entry) => {
            if !php_eligible(entry, php.as_ref()) {
                return None;
            }
            entry
        }
        RolloutTierSet::Staged(staged) => {
            let seed = percentile.percentile(&descriptor.installation_age_token);
            let Some(start) = starting_tier(staged, seed) else {
                debug!(percentile = ?seed, "client outside every rollout tier");
                return None;
            };
            let Some(tier) = staged[start..]
                .iter()
                .find(|tier| php_eligible(&tier.entry, php.as_ref()))
            else {
                debug!(percentile = ?seed, "every reachable tier rejected by PHP gate");
                return None;
            };
            debug!(percentile = ?seed, threshold = tier.threshold, "selected rollout tier");
            &tier.entry
        }
    };

    if !entry.latest_version.is_newer_than(current) {
        debug!(version = %current, latest = %entry.latest_version, "client already current");
        return None;
    }
    Some(entry)
}

/// Index of the tier whose band holds `seed`, in a highest-first slice.
fn starting_tier(tiers: &[RolloutTier], seed: Option<u8>) -> Option<usize> {
    if tiers.is_empty() {
        return None;
    }
    let Some(value) = seed else {
        return Some(0);
    };
    tiers.iter().enumerate().find_map(|(idx, tier)| {
        let floor = tiers.get(idx + 1).map_or(0, |lower| lower.threshold);
        (floor..tier.threshold).contains(&value).then_some(idx)
    })
}

/// Whether the client's PHP runtime meets `entry`'s minimum.
///
/// An entry with a minimum rejects clients that did not report PHP.
pub fn php_eligible(entry: &ReleaseEntry, php: Option<&VersionKey>) -> bool {
    match (&entry.min_php_version, php) {
        (None, _) => true,
        (Some(minimum), Some(runtime)) => {
            let ok = runtime.satisfies(minimum);
            if !ok {
                debug!(%runtime, %minimum, latest = %entry.latest_version, "PHP too old");
            }
            ok
        }
        (Some(minimum), None) => {
            debug!(%minimum, latest = %entry.latest_version, "PHP version not reported");
            false
        }
    }
}
