pub mod catalog;
pub mod config;
pub mod error;
pub mod manifest;
pub mod request;
pub mod types;
pub mod version;

pub use catalog::{
    ChannelCatalog, ReleaseCatalog, ReleaseEntry, RolloutTier, RolloutTierSet, SnapshotEntry,
    SnapshotTable, StepTable,
};
pub use config::ServerConfig;
pub use error::{CatalogError, ConfigError};
pub use manifest::{UpdateDecision, UpdateManifest};
pub use types::*;
pub use version::VersionKey;
