//! Uniqueness ledger: the only shared mutable state in generation.
//!
//! Implementations must make `check_and_record_all` atomic: two concurrent
//! callers racing on the same fingerprint never both succeed, and a call
//! either records every fingerprint it was given or none of them.

pub mod file;
pub mod fingerprint;
pub mod memory;

use async_trait::async_trait;

use crate::error::LedgerError;

pub use file::FileLedger;
pub use fingerprint::{Fingerprint, FingerprintKind, ParseFingerprintError};
pub use memory::MemoryLedger;

/// Record of every fingerprint generated so far.
#[async_trait]
pub trait UniquenessLedger: Send + Sync {
    /// Record every fingerprint in `fingerprints` as one unit.
    ///
    /// Returns `None` when all were new and are now recorded. Returns
    /// `Some(i)` when `fingerprints[i]` is the first one already seen; in
    /// that case nothing is recorded. On error nothing is recorded either.
    async fn check_and_record_all(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<Option<usize>, LedgerError>;

    /// Record `fingerprint`. Returns `true` if it was new, `false` if already seen.
    async fn check_and_record(&self, fingerprint: &Fingerprint) -> Result<bool, LedgerError> {
        let seen = self
            .check_and_record_all(std::slice::from_ref(fingerprint))
            .await?;
        Ok(seen.is_none())
    }

    /// Whether `fingerprint` has been recorded.
    async fn contains(&self, fingerprint: &Fingerprint) -> Result<bool, LedgerError>;

    /// Number of recorded fingerprints.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
