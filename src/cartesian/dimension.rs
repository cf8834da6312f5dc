//! Dimensions: independent axes of variation and the size of their product.

use serde::Serialize;

use crate::error::EngineError;
use crate::template::SlotScan;

/// Where a dimension's options come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardinalityKind {
    SpintaxSlot,
    List,
}

/// One axis of the combination space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionSpec {
    pub id: String,
    /// Number of mutually exclusive options.
    pub size: u64,
    pub kind: CardinalityKind,
}

impl DimensionSpec {
    pub fn list(id: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            size,
            kind: CardinalityKind::List,
        }
    }

    pub fn slot(position: usize, size: u64) -> Self {
        Self {
            id: slot_id(position),
            size,
            kind: CardinalityKind::SpintaxSlot,
        }
    }
}

/// Identifier used for the spintax slot at `position`.
pub fn slot_id(position: usize) -> String {
    format!("slot-{}", position)
}

/// Ordered dimensions, most significant first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionSet {
    dimensions: Vec<DimensionSpec>,
}

impl DimensionSet {
    pub fn new(dimensions: Vec<DimensionSpec>) -> Self {
        Self { dimensions }
    }

    pub fn push(&mut self, dimension: DimensionSpec) {
        self.dimensions.push(dimension);
    }

    /// Append one dimension per spintax slot.
    pub fn extend_with_slots(&mut self, scan: &SlotScan) {
        for slot in &scan.slots {
            self.push(DimensionSpec::slot(slot.position, slot.options.len() as u64));
        }
    }

    pub fn dimensions(&self) -> &[DimensionSpec] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn sizes(&self) -> Vec<u64> {
        self.dimensions.iter().map(|d| d.size).collect()
    }

    /// Product of all sizes.
    ///
    /// Fails with `ArithmeticOverflow` instead of wrapping. Any empty
    /// dimension makes the whole space empty. A set with no dimensions has
    /// exactly one (empty) combination.
    pub fn total(&self) -> Result<u64, EngineError> {
        if self.dimensions.iter().any(|d| d.size == 0) {
            return Ok(0);
        }
        let mut total: u64 = 1;
        for dimension in &self.dimensions {
            total = total
                .checked_mul(dimension.size)
                .ok_or_else(|| EngineError::ArithmeticOverflow {
                    dimension: dimension.id.clone(),
                })?;
        }
        Ok(total)
    }
}
