//! Mixed-radix addressing between linear indices and combinations.
//!
//! With sizes `[s0, s1, ..., sk-1]` the last dimension is the least
//! significant digit. Index `i` decodes to digits `d` with
//! `i = ((d0 * s1 + d1) * s2 + d2) ... + dk-1`, which is a bijection between
//! `[0, s0 * ... * sk-1)` and all combinations. Nothing is enumerated;
//! decoding and encoding are O(k).

use serde::Serialize;

use crate::cartesian::dimension::DimensionSet;
use crate::error::EngineError;

/// One selection index per dimension, in dimension order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CombinationAddress(Vec<u64>);

impl CombinationAddress {
    pub fn new(digits: Vec<u64>) -> Self {
        Self(digits)
    }

    pub fn digits(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_digits(self) -> Vec<u64> {
        self.0
    }
}

/// Index ↔ address conversion for a fixed set of dimension sizes.
#[derive(Debug, Clone)]
pub struct CombinationAddresser {
    sizes: Vec<u64>,
    total: u64,
}

impl CombinationAddresser {
    /// Build an addresser, failing on overflow before any decoding happens.
    pub fn new(dimensions: &DimensionSet) -> Result<Self, EngineError> {
        Ok(Self {
            sizes: dimensions.sizes(),
            total: dimensions.total()?,
        })
    }

    /// Size of the whole combination space.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// Decode `index` into an address, or `None` when `index >= total`.
    pub fn decode(&self, index: u64) -> Option<CombinationAddress> {
        if index >= self.total {
            return None;
        }
        let mut digits = vec![0; self.sizes.len()];
        let mut remaining = index;
        for (digit, &size) in digits.iter_mut().zip(&self.sizes).rev() {
            *digit = remaining % size;
            remaining /= size;
        }
        Some(CombinationAddress(digits))
    }

    /// Encode `address` back into its index (Horner accumulation).
    ///
    /// Returns `None` when the address has the wrong length or a digit is
    /// out of range for its dimension.
    pub fn encode(&self, address: &CombinationAddress) -> Option<u64> {
        if address.len() != self.sizes.len() {
            return None;
        }
        let mut index: u64 = 0;
        for (&digit, &size) in address.digits().iter().zip(&self.sizes) {
            if digit >= size {
                return None;
            }
            // Cannot overflow: the result is below `total`, which fits.
            index = index * size + digit;
        }
        Some(index)
    }
}

/// Decode `index` against raw dimension sizes.
pub fn decode_index(index: u64, sizes: &[u64]) -> Result<CombinationAddress, EngineError> {
    let addresser = from_sizes(sizes)?;
    addresser.decode(index).ok_or_else(|| {
        EngineError::config(format!(
            "index {} outside combination space of {}",
            index,
            addresser.total()
        ))
    })
}

/// Encode `address` against raw dimension sizes.
pub fn encode_address(address: &CombinationAddress, sizes: &[u64]) -> Result<u64, EngineError> {
    let addresser = from_sizes(sizes)?;
    addresser.encode(address).ok_or_else(|| {
        EngineError::config(format!(
            "address {:?} does not fit dimension sizes {:?}",
            address.digits(),
            sizes
        ))
    })
}

fn from_sizes(sizes: &[u64]) -> Result<CombinationAddresser, EngineError> {
    let dimensions = DimensionSet::new(
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| crate::cartesian::DimensionSpec::list(format!("dim-{}", i), size))
            .collect(),
    );
    CombinationAddresser::new(&dimensions)
}
