//! In-process ledger.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::LedgerError;
use crate::ledger::{Fingerprint, UniquenessLedger};

/// Ledger held in memory; lost when the process exits.
///
/// The set insert under one mutex is the serialization point.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    seen: Mutex<HashSet<Fingerprint>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with fingerprints recorded elsewhere.
    pub fn with_fingerprints(fingerprints: impl IntoIterator<Item = Fingerprint>) -> Self {
        Self {
            seen: Mutex::new(fingerprints.into_iter().collect()),
        }
    }

    /// Copy of every recorded fingerprint.
    pub fn snapshot(&self) -> Vec<Fingerprint> {
        let mut all: Vec<_> = self.seen.lock().iter().cloned().collect();
        all.sort();
        all
    }
}

#[async_trait]
impl UniquenessLedger for MemoryLedger {
    async fn check_and_record_all(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<Option<usize>, LedgerError> {
        let mut seen = self.seen.lock();
        if let Some(position) = fingerprints.iter().position(|fp| seen.contains(fp)) {
            tracing::trace!(
                fingerprint = %fingerprints[position],
                "Fingerprint already recorded"
            );
            return Ok(Some(position));
        }
        seen.extend(fingerprints.iter().cloned());
        Ok(None)
    }

    async fn contains(&self, fingerprint: &Fingerprint) -> Result<bool, LedgerError> {
        Ok(self.seen.lock().contains(fingerprint))
    }

    fn len(&self) -> usize {
        self.seen.lock().len()
    }
}
