//! Shared-ledger behaviour across concurrent and repeated runs.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::labels;
use spinweave::ledger::{FileLedger, MemoryLedger};
use spinweave::{CartesianConfig, CartesianEngine, DimensionSources, UniquenessLedger};
use tempfile::TempDir;

const TEMPLATE: &str = "{Quick|Fast|Rapid} {{niche}} {help|service|support}";

fn sources() -> DimensionSources {
    DimensionSources::new().with_list(labels("niche", &["roofing", "hvac", "plumbing", "siding"]))
}

fn range(offset: u64, batch_size: u64) -> CartesianConfig {
    CartesianConfig {
        offset,
        batch_size,
        ..CartesianConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_ranges_never_share_fingerprints() {
    let ledger: Arc<dyn UniquenessLedger> = Arc::new(MemoryLedger::new());

    let mut handles = Vec::new();
    for part in 0..4u64 {
        let engine = CartesianEngine::new(sources(), Arc::clone(&ledger));
        handles.push(tokio::spawn(async move {
            engine.generate_batch(&range(part * 9, 9), TEMPLATE).await
        }));
    }

    let mut fingerprints = HashSet::new();
    let mut total = 0;
    for handle in handles {
        let output = handle.await.unwrap().unwrap();
        total += output.results.len();
        for result in output.results {
            assert!(fingerprints.insert(result.fingerprint));
        }
    }
    assert_eq!(total, 36);
    assert_eq!(fingerprints.len(), 36);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_ranges_generate_each_index_once() {
    let ledger: Arc<dyn UniquenessLedger> = Arc::new(MemoryLedger::new());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let engine = CartesianEngine::new(sources(), Arc::clone(&ledger));
        handles.push(tokio::spawn(async move {
            engine.generate_batch(&range(0, 36), TEMPLATE).await
        }));
    }

    let mut indices = Vec::new();
    for handle in handles {
        let output = handle.await.unwrap().unwrap();
        indices.extend(output.results.iter().map(|r| r.index));
    }
    indices.sort_unstable();
    assert_eq!(indices, (0..36).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_file_ledger_resumes_after_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger").join("fingerprints.log");

    {
        let ledger = Arc::new(FileLedger::open(&path).unwrap());
        let engine = CartesianEngine::new(sources(), ledger);
        let output = engine.generate_batch(&range(0, 20), TEMPLATE).await.unwrap();
        assert_eq!(output.results.len(), 20);
    }

    let ledger = Arc::new(FileLedger::open(&path).unwrap());
    assert_eq!(ledger.len(), 40);
    let engine = CartesianEngine::new(sources(), ledger);

    let output = engine.generate_batch(&range(0, 36), TEMPLATE).await.unwrap();
    assert_eq!(output.results.len(), 16);
    assert_eq!(output.metadata.skipped_duplicates, 20);
    assert_eq!(output.results[0].index, 20);
}
