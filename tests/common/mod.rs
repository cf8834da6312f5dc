//! Shared test utilities and mock sources.

#![allow(dead_code, unused_imports)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use spinweave::ledger::{FingerprintKind, MemoryLedger};
use spinweave::{Fingerprint, LedgerError, UniquenessLedger};
use spinweave::sources::location::{CityEntry, CountyEntry, StateEntry};
use spinweave::sources::LocationCatalog;
use spinweave::{
    CartesianEngine, DimensionSource, DimensionSources, DimensionValue, SourceError, StaticSource,
};

/// A labels source built from string literals.
pub fn labels(id: &str, values: &[&str]) -> StaticSource {
    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    StaticSource::labels(id, &values)
}

/// Catalog of states without counties.
pub fn states(entries: &[(&str, &str)]) -> LocationCatalog {
    LocationCatalog {
        states: entries
            .iter()
            .map(|(name, code)| StateEntry {
                name: name.to_string(),
                code: code.to_string(),
                counties: Vec::new(),
            })
            .collect(),
    }
}

/// Texas with two counties and three cities.
pub fn texas_cities() -> LocationCatalog {
    let county = |id: &str, name: &str, cities: &[&str]| CountyEntry {
        id: Some(id.to_string()),
        name: name.to_string(),
        cities: cities
            .iter()
            .map(|city| CityEntry {
                id: None,
                name: city.to_string(),
            })
            .collect(),
    };
    LocationCatalog {
        states: vec![StateEntry {
            name: "Texas".to_string(),
            code: "TX".to_string(),
            counties: vec![
                county("tx-travis", "Travis County", &["Austin", "Pflugerville"]),
                county("tx-harris", "Harris County", &["Houston"]),
            ],
        }],
    }
}

/// Engine over `sources` with a fresh in-memory ledger.
pub fn engine(sources: DimensionSources) -> CartesianEngine {
    CartesianEngine::new(sources, Arc::new(MemoryLedger::new()))
}

/// Source that fails for one option and counts every fetch.
pub struct FlakySource {
    inner: StaticSource,
    failing_option: u64,
    fetches: Arc<AtomicUsize>,
}

impl FlakySource {
    pub fn new(inner: StaticSource, failing_option: u64) -> Self {
        Self {
            inner,
            failing_option,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl DimensionSource for FlakySource {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn len(&self) -> u64 {
        self.inner.len()
    }

    async fn fetch(&self, index: u64) -> Result<DimensionValue, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if index == self.failing_option {
            return Err(SourceError::Unavailable {
                dimension: self.id().to_string(),
                message: "upstream timeout".to_string(),
            });
        }
        self.inner.fetch(index).await
    }
}

/// Ledger that fails the first commit carrying a content fingerprint.
#[derive(Default)]
pub struct FailOnceLedger {
    inner: MemoryLedger,
    failed: AtomicBool,
}

impl FailOnceLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UniquenessLedger for FailOnceLedger {
    async fn check_and_record_all(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<Option<usize>, LedgerError> {
        let has_content = fingerprints
            .iter()
            .any(|fp| fp.kind() == FingerprintKind::Content);
        if has_content && !self.failed.swap(true, Ordering::SeqCst) {
            return Err(LedgerError::Io {
                path: "fail-once".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.check_and_record_all(fingerprints).await
    }

    async fn contains(&self, fingerprint: &Fingerprint) -> Result<bool, LedgerError> {
        self.inner.contains(fingerprint).await
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
