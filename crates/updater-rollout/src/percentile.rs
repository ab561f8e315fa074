//! Mapping installation-age tokens onto the rollout population.

use sha2::{Digest, Sha256};

/// Places a client in `[0, 100)` for staged-rollout gating.
///
/// Must be deterministic: the same token always lands in the same
/// place, so a client never flips between tiers across polls.
pub trait RolloutPercentile: Send + Sync {
    /// `None` when the token carries no usable seed.
    fn percentile(&self, token: &str) -> Option<u8>;
}

/// Default bucketing keyed on the installation mtime.
///
/// Numeric tokens use the integer part modulo 100 (`9901` → 1,
/// `1448709225.0768` → 25). Anything else is hashed with SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallationAgePercentile;

impl RolloutPercentile for InstallationAgePercentile {
    fn percentile(&self, token: &str) -> Option<u8> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let whole = token.split('.').next().unwrap_or(token);
        let value = match whole.parse::<u64>() {
            Ok(n) => n % 100,
            Err(_) => {
                let digest = Sha256::digest(token.as_bytes());
                let mut prefix = [0u8; 8];
                prefix.copy_from_slice(&digest[..8]);
                u64::from_be_bytes(prefix) % 100
            }
        };
        Some(value as u8)
    }
}
