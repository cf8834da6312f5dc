//! Cartesian engine: pages through the combination space.
//!
//! ```text
//! config → plan (dimensions, total, range) → per index:
//!     decode → fetch options → assemble → fingerprint → ledger → result
//! ```
//!
//! Each index is independent. The only shared state is the injected
//! ledger, so disjoint ranges can run concurrently and a run can resume at
//! any index after a crash.
//!
//! Every spintax slot is a dimension, nested ones included. A digit for a
//! group inside an option that was not chosen changes nothing, so nested
//! templates address more indices than they have distinct texts. Those
//! indices resolve to an already recorded structural fingerprint and are
//! counted in `skipped_duplicates`; `distinct_spintax_combinations` in the
//! metadata reports how many spintax selections can actually differ.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::cartesian::addresser::CombinationAddresser;
use crate::cartesian::dimension::{slot_id, DimensionSet, DimensionSpec};
use crate::cartesian::types::{
    BatchOutput, CartesianConfig, CartesianMetadata, CartesianResult, EngineWarning, IndexFailure,
};
use crate::error::{EngineError, LedgerError, SourceError};
use crate::ledger::{Fingerprint, UniquenessLedger};
use crate::shutdown::ShutdownHandle;
use crate::sources::{DimensionSource, DimensionSources, StaticSource};
use crate::template::{assemble, parse_slots, IndexChooser, SlotScan, Variables, Variant};

/// Everything fixed for one request before any index is decoded.
struct Plan {
    scan: SlotScan,
    addresser: CombinationAddresser,
    /// List sources in dimension order (location first when present).
    sources: Vec<Arc<dyn DimensionSource>>,
    total_spintax: u64,
    distinct_spintax: u64,
    location_count: u64,
    list_combinations: u64,
    /// `min(total, max_combinations)`.
    limit: u64,
    start: u64,
    end: u64,
}

enum Outcome {
    Generated(Box<CartesianResult>),
    Duplicate(Fingerprint),
    Failed(IndexError),
}

enum IndexError {
    Source(SourceError),
    Ledger(LedgerError),
}

impl IndexError {
    fn into_engine_error(self, index: u64) -> EngineError {
        match self {
            IndexError::Source(source) => EngineError::Collaborator { index, source },
            IndexError::Ledger(source) => EngineError::Ledger { index, source },
        }
    }

    fn message(&self) -> String {
        match self {
            IndexError::Source(e) => e.to_string(),
            IndexError::Ledger(e) => e.to_string(),
        }
    }
}

/// Generates articles from a template over a set of dimension sources.
///
/// Cheap to clone; clones share sources and ledger.
#[derive(Clone)]
pub struct CartesianEngine {
    sources: DimensionSources,
    ledger: Arc<dyn UniquenessLedger>,
}

impl CartesianEngine {
    pub fn new(sources: DimensionSources, ledger: Arc<dyn UniquenessLedger>) -> Self {
        Self { sources, ledger }
    }

    pub fn ledger(&self) -> &Arc<dyn UniquenessLedger> {
        &self.ledger
    }

    /// Describe the combination space for `config` without generating anything.
    pub fn describe(
        &self,
        config: &CartesianConfig,
        template: &str,
    ) -> Result<CartesianMetadata, EngineError> {
        let plan = self.plan(config, template)?;
        Ok(plan.metadata(template, 0, plan.start, 0, scan_warnings(&plan.scan)))
    }

    /// Generate the indices `[offset, offset + batch_size)`, clamped to the addressable range.
    pub async fn generate_batch(
        &self,
        config: &CartesianConfig,
        template: &str,
    ) -> Result<BatchOutput, EngineError> {
        self.run(config, template, None).await
    }

    /// Like [`generate_batch`](Self::generate_batch), but stops before the
    /// next index once `cancel` is signalled. `next_offset` in the metadata
    /// is the first index that was not processed.
    pub async fn generate_batch_cancellable(
        &self,
        config: &CartesianConfig,
        template: &str,
        cancel: &ShutdownHandle,
    ) -> Result<BatchOutput, EngineError> {
        self.run(config, template, Some(cancel)).await
    }

    /// Split the requested range into `partitions` disjoint ranges and
    /// generate them concurrently against the shared ledger.
    ///
    /// Results are merged in index order.
    pub async fn generate_partitioned(
        &self,
        config: &CartesianConfig,
        template: &str,
        partitions: usize,
    ) -> Result<BatchOutput, EngineError> {
        self.partitioned(config, template, partitions, None).await
    }

    /// Like [`generate_partitioned`](Self::generate_partitioned), but every
    /// partition stops before its next index once `cancel` is signalled.
    ///
    /// `next_offset` is the lowest index any partition left unprocessed.
    /// Later partitions may have finished past it; resuming there replays
    /// those indices and the ledger skips them as duplicates.
    pub async fn generate_partitioned_cancellable(
        &self,
        config: &CartesianConfig,
        template: &str,
        partitions: usize,
        cancel: &ShutdownHandle,
    ) -> Result<BatchOutput, EngineError> {
        self.partitioned(config, template, partitions, Some(cancel.clone()))
            .await
    }

    async fn partitioned(
        &self,
        config: &CartesianConfig,
        template: &str,
        partitions: usize,
        cancel: Option<ShutdownHandle>,
    ) -> Result<BatchOutput, EngineError> {
        let plan = self.plan(config, template)?;
        let span = plan.end - plan.start;
        let partitions = (partitions.max(1) as u64).min(span.max(1));
        let chunk = span.div_ceil(partitions);

        let mut tasks = JoinSet::new();
        let mut offset = plan.start;
        while offset < plan.end {
            let part_end = offset + chunk.min(plan.end - offset);
            let part = CartesianConfig {
                offset,
                batch_size: part_end - offset,
                ..config.clone()
            };
            let engine = self.clone();
            let template = template.to_string();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let output = engine.run(&part, &template, cancel.as_ref()).await?;
                Ok::<_, EngineError>((part_end, output))
            });
            offset = part_end;
        }

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut skipped = 0;
        let mut warnings = scan_warnings(&plan.scan);
        let mut next_offset = plan.end;
        while let Some(joined) = tasks.join_next().await {
            let (part_end, output) = joined.map_err(|e| EngineError::Internal(e.to_string()))??;
            if output.metadata.next_offset < part_end {
                next_offset = next_offset.min(output.metadata.next_offset);
            }
            results.extend(output.results);
            failures.extend(output.failures);
            skipped += output.metadata.skipped_duplicates;
            for warning in output.metadata.warnings {
                push_unique(&mut warnings, warning);
            }
        }
        results.sort_by_key(|r| r.index);
        failures.sort_by_key(|f| f.index);

        tracing::info!(
            partitions,
            generated = results.len(),
            skipped,
            failed = failures.len(),
            "Partitioned batch complete"
        );

        let generated = results.len() as u64;
        let metadata = plan.metadata(template, generated, next_offset, skipped, warnings);
        Ok(BatchOutput {
            results,
            metadata,
            failures,
        })
    }

    fn plan(&self, config: &CartesianConfig, template: &str) -> Result<Plan, EngineError> {
        if config.batch_size == 0 {
            return Err(EngineError::config("batch_size must be positive"));
        }
        if config.max_combinations == 0 {
            return Err(EngineError::config("max_combinations must be positive"));
        }

        let scan = parse_slots(template);
        let total_spintax = scan
            .total_combinations()
            .ok_or_else(|| EngineError::ArithmeticOverflow {
                dimension: "spintax".to_string(),
            })?;
        let distinct_spintax = scan.distinct_combinations().unwrap_or(total_spintax);

        let mut dimensions = DimensionSet::default();
        let mut sources = Vec::new();
        let mut location_count = 0;

        if config.uses_locations() {
            let catalog = self.sources.location.as_deref().ok_or_else(|| {
                EngineError::config("locations requested but no location catalog is configured")
            })?;
            let selected = catalog.select(
                config.location_mode,
                config.location_target_id.as_deref(),
            );
            location_count = selected.len() as u64;
            if selected.is_empty() {
                tracing::warn!(
                    mode = ?config.location_mode,
                    target = ?config.location_target_id,
                    "Location selection is empty"
                );
            } else {
                let location: Arc<dyn DimensionSource> =
                    Arc::new(StaticSource::locations(selected));
                dimensions.push(DimensionSpec::list(location.id(), location_count));
                sources.push(location);
            }
        }

        let mut list_dimensions = DimensionSet::default();
        for source in &self.sources.lists {
            let spec = DimensionSpec::list(source.id(), source.len());
            list_dimensions.push(spec.clone());
            dimensions.push(spec);
            sources.push(Arc::clone(source));
        }
        let list_combinations = list_dimensions.total()?;

        dimensions.extend_with_slots(&scan);
        let addresser = CombinationAddresser::new(&dimensions)?;
        let total = addresser.total();
        let limit = total.min(config.max_combinations);

        if total > 0 && config.offset > limit {
            return Err(EngineError::config(format!(
                "offset {} is beyond the addressable range of {}",
                config.offset, limit
            )));
        }
        let start = config.offset.min(limit);
        let end = start.saturating_add(config.batch_size).min(limit);

        tracing::debug!(
            slots = scan.slots.len(),
            dimensions = dimensions.len(),
            total,
            limit,
            start,
            end,
            "Planned batch"
        );

        Ok(Plan {
            scan,
            addresser,
            sources,
            total_spintax,
            distinct_spintax,
            location_count,
            list_combinations,
            limit,
            start,
            end,
        })
    }

    async fn run(
        &self,
        config: &CartesianConfig,
        template: &str,
        cancel: Option<&ShutdownHandle>,
    ) -> Result<BatchOutput, EngineError> {
        let plan = self.plan(config, template)?;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut warnings = scan_warnings(&plan.scan);
        let mut skipped = 0;
        let mut next_offset = plan.start;

        for index in plan.start..plan.end {
            if cancel.is_some_and(|c| c.is_shutting_down()) {
                tracing::info!(next_offset = index, "Batch cancelled");
                break;
            }

            let outcome = self
                .generate_index(&plan, config, template, index, &mut warnings)
                .await?;
            match outcome {
                Outcome::Generated(result) => results.push(*result),
                Outcome::Duplicate(fingerprint) => {
                    tracing::debug!(index, fingerprint = %fingerprint, "Skipping duplicate");
                    skipped += 1;
                    warnings.push(EngineWarning::FingerprintCollision {
                        index,
                        fingerprint: fingerprint.kind().into(),
                    });
                }
                Outcome::Failed(error) => {
                    if config.all_or_nothing {
                        return Err(error.into_engine_error(index));
                    }
                    let message = error.message();
                    tracing::warn!(index, error = %message, "Index failed");
                    failures.push(IndexFailure { index, message });
                }
            }
            next_offset = index + 1;
        }

        let generated = results.len() as u64;
        let metadata = plan.metadata(template, generated, next_offset, skipped, warnings);
        Ok(BatchOutput {
            results,
            metadata,
            failures,
        })
    }

    async fn generate_index(
        &self,
        plan: &Plan,
        config: &CartesianConfig,
        template: &str,
        index: u64,
        warnings: &mut Vec<EngineWarning>,
    ) -> Result<Outcome, EngineError> {
        let address = plan.addresser.decode(index).ok_or_else(|| {
            EngineError::config(format!("index {} outside combination space", index))
        })?;
        let (list_digits, slot_digits) = address.digits().split_at(plan.sources.len());

        let mut variant = Variant::new();
        let mut variables = Variables::new();
        let mut keys = Vec::with_capacity(plan.sources.len());
        let mut selections = BTreeMap::new();
        let mut location = None;

        for (source, &digit) in plan.sources.iter().zip(list_digits) {
            let value = match source.fetch(digit).await {
                Ok(value) => value,
                Err(e) => return Ok(Outcome::Failed(IndexError::Source(e))),
            };
            variant.extend(value.variant);
            variables.extend(value.variables);
            selections.insert(source.id().to_string(), value.label);
            keys.push((source.id().to_string(), value.key));
            if value.location.is_some() {
                location = value.location;
            }
        }

        let mut chooser = IndexChooser::new(slot_digits);
        let assembly = assemble(template, &variant, &variables, &mut chooser);
        for warning in assembly.warnings {
            push_unique(warnings, EngineWarning::MalformedTemplate { detail: warning });
        }

        let key_refs: Vec<(&str, &str)> = keys
            .iter()
            .map(|(dimension, key)| (dimension.as_str(), key.as_str()))
            .collect();
        let fingerprint =
            Fingerprint::structural(&config.namespace, &key_refs, &assembly.spintax_text);
        let content_fingerprint = Fingerprint::content(&config.namespace, &assembly.text);

        let mut claimed = vec![fingerprint.clone()];
        if config.content_dedup {
            claimed.push(content_fingerprint.clone());
        }
        match self.ledger.check_and_record_all(&claimed).await {
            Ok(None) => {}
            Ok(Some(position)) => {
                return Ok(Outcome::Duplicate(claimed.swap_remove(position)));
            }
            Err(e) => return Ok(Outcome::Failed(IndexError::Ledger(e))),
        }

        let slot_values = assembly
            .choices
            .into_iter()
            .enumerate()
            .map(|(position, choice)| (slot_id(position), choice))
            .collect();

        tracing::trace!(index, fingerprint = %fingerprint, "Generated combination");

        Ok(Outcome::Generated(Box::new(CartesianResult {
            text: assembly.text,
            slot_values,
            selections,
            location,
            index,
            fingerprint,
            content_fingerprint,
            unresolved: assembly.unresolved,
        })))
    }
}

impl Plan {
    fn metadata(
        &self,
        template: &str,
        generated_count: u64,
        next_offset: u64,
        skipped_duplicates: u64,
        warnings: Vec<EngineWarning>,
    ) -> CartesianMetadata {
        let total = self.addresser.total();
        CartesianMetadata {
            template: template.to_string(),
            slot_count: self.scan.slots.len(),
            total_spintax_combinations: self.total_spintax,
            distinct_spintax_combinations: self.distinct_spintax,
            location_count: self.location_count,
            list_combinations: self.list_combinations,
            total_possible_combinations: total,
            addressable_combinations: self.limit,
            generated_count,
            was_truncated: self.limit < total,
            next_offset,
            skipped_duplicates,
            warnings,
        }
    }
}

fn scan_warnings(scan: &SlotScan) -> Vec<EngineWarning> {
    scan.warnings
        .iter()
        .map(|&detail| EngineWarning::MalformedTemplate { detail })
        .collect()
}

fn push_unique(warnings: &mut Vec<EngineWarning>, warning: EngineWarning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}
