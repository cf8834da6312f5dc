//! Cartesian permutation engine.
//!
//! ```text
//! DimensionSet → CombinationAddresser → CartesianEngine → BatchOutput
//! ```
//!
//! The addresser maps linear indices to one selection per dimension with
//! integer arithmetic only, so the combination space is never materialised.

mod addresser;
mod dimension;
mod engine;
mod types;

pub use addresser::{decode_index, encode_address, CombinationAddress, CombinationAddresser};
pub use dimension::{slot_id, CardinalityKind, DimensionSet, DimensionSpec};
pub use engine::CartesianEngine;
pub use types::{
    BatchOutput, CartesianConfig, CartesianMetadata, CartesianResult, CollisionKind,
    EngineWarning, IndexFailure,
};
