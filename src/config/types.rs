use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Default generation settings, overridable per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Indices per batch (default: 100).
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Cap on addressable combinations (default: 10000).
    #[serde(default = "default_max_combinations")]
    pub max_combinations: u64,
    /// Fingerprint namespace when a campaign does not name a site (default: "default").
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Reject repeated final text as well as repeated selections (default: true).
    #[serde(default = "default_content_dedup")]
    pub content_dedup: bool,
    /// Concurrent partitions per batch (default: 1).
    #[serde(default = "default_partitions")]
    pub partitions: usize,
}

/// Where fingerprints are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Ledger file. When unset, fingerprints only live for the current run.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_batch_size() -> u64 {
    100
}

fn default_max_combinations() -> u64 {
    10_000
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_content_dedup() -> bool {
    true
}

fn default_partitions() -> usize {
    1
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_combinations: default_max_combinations(),
            namespace: default_namespace(),
            content_dedup: default_content_dedup(),
            partitions: default_partitions(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            ledger: LedgerConfig::default(),
        }
    }
}
