//! Deterministic article variation: spintax, grammar and variable templates
//! crossed with list dimensions, addressed by a single linear index.

pub mod cartesian;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod shutdown;
pub mod sources;
pub mod template;

pub use cartesian::{BatchOutput, CartesianConfig, CartesianEngine, CartesianResult};
pub use error::{EngineError, LedgerError, SourceError};
pub use ledger::{FileLedger, Fingerprint, MemoryLedger, UniquenessLedger};
pub use sources::{DimensionSource, DimensionSources, DimensionValue, StaticSource};
