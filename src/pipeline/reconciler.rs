use anyhow::{Result, anyhow};
use tracing::{error, info};

use crate::storage::e_tag_verify::is_segmented_e_tag;
use crate::types::StatResult;
use crate::types::error::MigrateError;
use crate::types::metadata::{
    CONTENT_TYPE_HEADER, Discrepancy, ETAG_HEADER, ExceptionSet, MetadataRecord,
    NORMALIZED_ARCHIVE_CONTENT_TYPE, SourceSystem,
};

#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    pub exceptions: ExceptionSet,
    pub source_system: SourceSystem,
}

impl ReconcilePolicy {
    pub fn new(exceptions: ExceptionSet, source_system: SourceSystem) -> Self {
        ReconcilePolicy {
            exceptions,
            source_system,
        }
    }

    /// Policy applied against one destination record. A segmented destination
    /// tag never equals the whole-object source tag, so `etag` is excepted for
    /// it; segmented uploads are covered by the segmented checksum instead.
    pub fn for_destination(&self, destination: &MetadataRecord) -> ReconcilePolicy {
        match destination.etag() {
            Some(e_tag) if is_segmented_e_tag(e_tag) => ReconcilePolicy {
                exceptions: self.exceptions.including(ETAG_HEADER),
                source_system: self.source_system,
            },
            _ => self.clone(),
        }
    }
}

/// Outcome of comparing one positionally paired stat result.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Compared {
        object: String,
        discrepancies: Vec<Discrepancy>,
    },
    StatFailed {
        object: String,
        error: String,
    },
}

/// Compares every source header against the destination record.
///
/// Only keys present on the source are inspected; extra destination keys are
/// never reported.
pub fn reconcile(
    source: &MetadataRecord,
    destination: &MetadataRecord,
    policy: &ReconcilePolicy,
) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();

    for (key, source_value) in source.iter() {
        if policy.exceptions.contains(key) {
            continue;
        }

        let Some(destination_value) = destination.get(key) else {
            error!(
                header = key,
                "{key} not present in destination: {source_value}"
            );
            discrepancies.push(Discrepancy::MissingOnDestination {
                key: key.to_string(),
                source_value: source_value.to_string(),
            });
            continue;
        };

        if is_legacy_content_type_override(policy.source_system, key, destination_value) {
            info!(
                header = key,
                source_value = source_value,
                destination_value = destination_value,
                "{key} differs; expected for the legacy source system."
            );
        } else if source_value != destination_value {
            error!(
                header = key,
                "{key} differs: {source_value} <> {destination_value}"
            );
            discrepancies.push(Discrepancy::ValueMismatch {
                key: key.to_string(),
                source_value: source_value.to_string(),
                destination_value: destination_value.to_string(),
            });
        } else {
            info!(header = key, value = source_value, "{key} matches.");
        }
    }

    discrepancies
}

/// Pairs two batched stat streams by position and reconciles each pair.
pub fn reconcile_batch(
    source_results: &[StatResult],
    destination_results: &[StatResult],
    policy: &ReconcilePolicy,
) -> Result<Vec<PairOutcome>> {
    if source_results.len() != destination_results.len() {
        return Err(anyhow!(MigrateError::StatMismatch {
            source_count: source_results.len(),
            destination_count: destination_results.len(),
        }));
    }

    let outcomes = source_results
        .iter()
        .zip(destination_results)
        .map(|(source, destination)| {
            if let Some(error) = stat_failure(source, "source")
                .or_else(|| stat_failure(destination, "destination"))
            {
                return PairOutcome::StatFailed {
                    object: source.object.clone(),
                    error,
                };
            }

            PairOutcome::Compared {
                object: source.object.clone(),
                discrepancies: reconcile(
                    &source.headers,
                    &destination.headers,
                    &policy.for_destination(&destination.headers),
                ),
            }
        })
        .collect();

    Ok(outcomes)
}

fn stat_failure(result: &StatResult, side: &str) -> Option<String> {
    if result.success {
        return None;
    }

    Some(format!(
        "{side} stat failed. object={}: {}",
        result.object,
        result.error.as_deref().unwrap_or("unknown error")
    ))
}

fn is_legacy_content_type_override(
    source_system: SourceSystem,
    key: &str,
    destination_value: &str,
) -> bool {
    source_system.is_legacy()
        && key == CONTENT_TYPE_HEADER
        && destination_value == NORMALIZED_ARCHIVE_CONTENT_TYPE
}
