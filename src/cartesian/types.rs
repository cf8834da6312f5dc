//! Request and response types for batch generation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ledger::{Fingerprint, FingerprintKind};
use crate::sources::{Location, LocationMode};
use crate::template::TemplateWarning;

/// One page of generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartesianConfig {
    /// Upper bound on addressable indices, regardless of the space size.
    pub max_combinations: u64,
    #[serde(default)]
    pub include_locations: bool,
    #[serde(default)]
    pub location_mode: LocationMode,
    #[serde(default)]
    pub location_target_id: Option<String>,
    pub batch_size: u64,
    #[serde(default)]
    pub offset: u64,
    /// Abort the batch on the first collaborator failure.
    #[serde(default)]
    pub all_or_nothing: bool,
    /// Also reject results whose final text was already generated.
    #[serde(default = "default_content_dedup")]
    pub content_dedup: bool,
    /// Fingerprint namespace, typically the site id.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_content_dedup() -> bool {
    true
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for CartesianConfig {
    fn default() -> Self {
        Self {
            max_combinations: 10_000,
            include_locations: false,
            location_mode: LocationMode::None,
            location_target_id: None,
            batch_size: 100,
            offset: 0,
            all_or_nothing: false,
            content_dedup: default_content_dedup(),
            namespace: default_namespace(),
        }
    }
}

impl CartesianConfig {
    /// Whether the location dimension takes part in this request.
    pub fn uses_locations(&self) -> bool {
        self.include_locations && self.location_mode != LocationMode::None
    }
}

/// One generated article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartesianResult {
    pub text: String,
    /// Spintax slot id → chosen option.
    pub slot_values: BTreeMap<String, String>,
    /// List dimension id → chosen option label.
    pub selections: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Linear address this result was decoded from.
    pub index: u64,
    pub fingerprint: Fingerprint,
    pub content_fingerprint: Fingerprint,
    /// Variable keys that had no value and no default.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}

/// Non-fatal conditions met while generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    MalformedTemplate { detail: TemplateWarning },
    FingerprintCollision { index: u64, fingerprint: CollisionKind },
}

/// Which fingerprint collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    Structural,
    Content,
}

impl From<FingerprintKind> for CollisionKind {
    fn from(kind: FingerprintKind) -> Self {
        match kind {
            FingerprintKind::Structural => CollisionKind::Structural,
            FingerprintKind::Content => CollisionKind::Content,
        }
    }
}

/// A single index that could not be generated because a collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexFailure {
    pub index: u64,
    pub message: String,
}

/// Summary of the combination space and of one batch over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartesianMetadata {
    pub template: String,
    pub slot_count: usize,
    pub total_spintax_combinations: u64,
    /// Spintax selections that can render differently. Lower than
    /// `total_spintax_combinations` when groups nest: addresses that differ
    /// only inside an unchosen option produce the same text and are
    /// skipped as structural duplicates.
    pub distinct_spintax_combinations: u64,
    pub location_count: u64,
    /// Product of every list dimension other than location.
    pub list_combinations: u64,
    pub total_possible_combinations: u64,
    /// `min(total_possible_combinations, max_combinations)`.
    pub addressable_combinations: u64,
    pub generated_count: u64,
    pub was_truncated: bool,
    /// First index not yet processed; pass as `offset` to resume.
    pub next_offset: u64,
    pub skipped_duplicates: u64,
    pub warnings: Vec<EngineWarning>,
}

/// Everything returned for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutput {
    pub results: Vec<CartesianResult>,
    pub metadata: CartesianMetadata,
    pub failures: Vec<IndexFailure>,
}

impl BatchOutput {
    /// Whether every addressable index has been processed.
    pub fn is_exhausted(&self) -> bool {
        self.metadata.next_offset >= self.metadata.addressable_combinations
    }
}
