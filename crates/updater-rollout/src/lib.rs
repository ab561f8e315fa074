//! Update resolution — upgrade chains, staged rollout, PHP gating.
//!
//! This crate decides, per client poll, whether a newer release should
//! be offered. It is a pure function of the client descriptor, the
//! release catalog, and two injected capabilities (a clock and a
//! rollout percentile source).
//!
//! # Components
//!
//! - **`resolver`** — picks the catalog bucket for a client
//! - **`selector`** — picks one entry within a bucket (rollout tiers, PHP gate)
//! - **`percentile`** — maps installation-age tokens into `[0, 100)`
//! - **`clock`** — wall-clock capability for daily-build freshness
//! - **`engine`** — ties the above together and builds the manifest

pub mod clock;
pub mod engine;
pub mod percentile;
pub mod resolver;
pub mod selector;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{DAILY_LABEL, DAILY_SENTINEL_VERSION, EnginePolicy, UpdateEngine};
pub use percentile::{InstallationAgePercentile, RolloutPercentile};
pub use resolver::Resolution;
