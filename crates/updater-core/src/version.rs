//! Numeric version keys (`8`, `8.0`, `8.0.7`, `8.0.7.1`).
//!
//! Keys are compared component-by-component as integers, never as
//! strings, so `8.0.10` sorts after `8.0.9`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of components a key may carry.
pub const MAX_COMPONENTS: usize = 4;

/// An ordered tuple of 1–4 numeric components.
///
/// Present components always form a contiguous prefix. The derived
/// ordering is lexicographic over present components with an absent
/// component sorting before any present one, so `8` < `8.0` < `8.0.0`.
/// Use [`VersionKey::numeric_cmp`] when absent components should count
/// as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionKey {
    components: [Option<u32>; MAX_COMPONENTS],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionKeyError {
    #[error("version key is empty")]
    Empty,
    #[error("version key has more than four components: {0}")]
    TooLong(String),
    #[error("invalid version component {component:?} in {input:?}")]
    InvalidComponent { input: String, component: String },
}

impl VersionKey {
    /// Build a key from numeric components, most significant first.
    pub fn new(components: &[u32]) -> Option<Self> {
        if components.is_empty() || components.len() > MAX_COMPONENTS {
            return None;
        }
        let mut key = [None; MAX_COMPONENTS];
        for (slot, value) in key.iter_mut().zip(components) {
            *slot = Some(*value);
        }
        Some(Self { components: key })
    }

    /// A key with all four components present.
    pub const fn from_parts(parts: [u32; MAX_COMPONENTS]) -> Self {
        Self {
            components: [Some(parts[0]), Some(parts[1]), Some(parts[2]), Some(parts[3])],
        }
    }

    /// Build the most specific key obtainable from reported string
    /// components, where an empty string means "not reported".
    ///
    /// Components are consumed until the first empty one. Returns `None`
    /// when the leading component is empty or any consumed component is
    /// not a plain non-negative integer.
    pub fn from_reported(parts: &[&str]) -> Option<Self> {
        let mut key = [None; MAX_COMPONENTS];
        let mut len = 0;
        for part in parts.iter().take(MAX_COMPONENTS) {
            if part.is_empty() {
                break;
            }
            key[len] = Some(parse_component(part)?);
            len += 1;
        }
        (len > 0).then_some(Self { components: key })
    }

    /// Number of present components.
    pub fn len(&self) -> usize {
        self.components.iter().take_while(|c| c.is_some()).count()
    }

    /// Always false; a key carries at least one component.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn major(&self) -> u32 {
        self.components[0].unwrap_or_default()
    }

    pub fn component(&self, index: usize) -> Option<u32> {
        self.components.get(index).copied().flatten()
    }

    /// The key cut down to its first `len` components.
    pub fn truncated(&self, len: usize) -> Option<Self> {
        if len == 0 || len > self.len() {
            return None;
        }
        let mut key = self.components;
        for slot in key.iter_mut().skip(len) {
            *slot = None;
        }
        Some(Self { components: key })
    }

    /// Every prefix of this key, most specific first
    /// (`8.0.7.1`, `8.0.7`, `8.0`, `8`).
    pub fn prefixes(&self) -> impl Iterator<Item = VersionKey> + '_ {
        (1..=self.len()).rev().filter_map(|len| self.truncated(len))
    }

    /// Numeric comparison treating absent trailing components as zero,
    /// so `8.0.10` equals `8.0.10.0`.
    pub fn numeric_cmp(&self, other: &Self) -> Ordering {
        self.components
            .iter()
            .zip(other.components.iter())
            .map(|(a, b)| a.unwrap_or(0).cmp(&b.unwrap_or(0)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// True when this key is numerically newer than `other`.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.numeric_cmp(other) == Ordering::Greater
    }

    /// True when this key is numerically at least `minimum`.
    pub fn satisfies(&self, minimum: &Self) -> bool {
        self.numeric_cmp(minimum) != Ordering::Less
    }
}

fn parse_component(part: &str) -> Option<u32> {
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, value) in self.components.iter().map_while(|c| *c).enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromStr for VersionKey {
    type Err = VersionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionKeyError::Empty);
        }
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > MAX_COMPONENTS {
            return Err(VersionKeyError::TooLong(s.to_string()));
        }
        let mut key = [None; MAX_COMPONENTS];
        for (slot, part) in key.iter_mut().zip(&parts) {
            let value = parse_component(part).ok_or_else(|| VersionKeyError::InvalidComponent {
                input: s.to_string(),
                component: part.to_string(),
            })?;
            *slot = Some(value);
        }
        Ok(Self { components: key })
    }
}

impl TryFrom<String> for VersionKey {
    type Error = VersionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionKey> for String {
    fn from(key: VersionKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> VersionKey {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_renders_canonically() {
        for s in ["8", "8.0", "8.0.7", "8.0.7.1", "100.0.0.0"] {
            assert_eq!(key(s).to_string(), s);
        }
        assert_eq!(key("8.0.7").len(), 3);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!("".parse::<VersionKey>(), Err(VersionKeyError::Empty));
        assert!(matches!(
            "1.2.3.4.5".parse::<VersionKey>(),
            Err(VersionKeyError::TooLong(_))
        ));
        for bad in ["8.", ".8", "8..0", "8.a", "-1", "+1", "8.0 beta"] {
            assert!(bad.parse::<VersionKey>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn double_digit_components_compare_numerically() {
        assert!(key("8.0.10") > key("8.0.9"));
        assert!(key("8.0.10").is_newer_than(&key("8.0.9")));
        assert!(key("10") > key("9.9.9.9"));
    }

    #[test]
    fn shorter_key_sorts_before_its_extensions() {
        assert!(key("8") < key("8.0"));
        assert!(key("8.0") < key("8.0.0"));
        assert_ne!(key("8"), key("8.0"));
    }

    #[test]
    fn numeric_cmp_pads_with_zero() {
        assert_eq!(key("8.0.10").numeric_cmp(&key("8.0.10.0")), Ordering::Equal);
        assert!(!key("8.0.10").is_newer_than(&key("8.0.10.0")));
        assert!(key("8.0.7.1").is_newer_than(&key("8.0.7")));
        assert!(key("5.6.0").satisfies(&key("5.6")));
        assert!(!key("5.4.0").satisfies(&key("5.6")));
    }

    #[test]
    fn from_reported_stops_at_first_absent_component() {
        assert_eq!(VersionKey::from_reported(&["8", "0", "8", ""]), Some(key("8.0.8")));
        assert_eq!(VersionKey::from_reported(&["8", "", "5", ""]), Some(key("8")));
        assert_eq!(VersionKey::from_reported(&["", "0", "0", "0"]), None);
        assert_eq!(VersionKey::from_reported(&["8", "x", "", ""]), None);
    }

    #[test]
    fn prefixes_run_most_specific_first() {
        let probes: Vec<String> = key("8.0.7.1").prefixes().map(|k| k.to_string()).collect();
        assert_eq!(probes, ["8.0.7.1", "8.0.7", "8.0", "8"]);
    }

    #[test]
    fn deserializes_from_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            v: VersionKey,
        }
        let w: Wrapper = toml::from_str(r#"v = "8.2.2""#).unwrap();
        assert_eq!(w.v, key("8.2.2"));
        assert!(toml::from_str::<Wrapper>(r#"v = "8.x""#).is_err());
    }
}
