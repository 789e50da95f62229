//! Cluster configuration for citc.
//!
//! This crate owns the defaults, the merge of the different input
//! sources (saved checkpoint input, `--json` files, CLI flags), the
//! interactive prompts, and public-key resolution.

pub mod config;
pub mod prompt;
pub mod pubkey;

pub use config::{ConfigError, DestroyFlags, GatheredInput, InputSource, InstallFlags};
pub use pubkey::{KeySource, PubkeyError};

/// Default Google Cloud zone for new clusters.
pub const DEFAULT_ZONE: &str = "europe-west2-c";

/// Default machine shape for the management node.
pub const DEFAULT_SHAPE: &str = "n1-standard-1";

/// Default citc-terraform branch.
pub const DEFAULT_BRANCH: &str = "master";

/// Derive the region from a zone name by dropping the trailing zone
/// letter: `europe-west2-c` lives in region `europe-west2`.
pub fn region_from_zone(zone: &str) -> String {
    match zone.rsplit_once('-') {
        Some((region, _)) => region.to_string(),
        None => zone.to_string(),
    }
}

/// Generate a memorable two-word cluster name, e.g. `wanted-mullet`.
pub fn generate_cluster_name() -> String {
    petname::petname(2, "-")
}
