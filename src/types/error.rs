use thiserror::Error;

use crate::types::metadata::Discrepancy;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrateError {
    #[error("download failed. object={object}: {reason}")]
    Fetch { object: String, reason: String },
    #[error("checksum failure. object={object} path={path}: {actual} <> {expected}")]
    Integrity {
        object: String,
        path: String,
        expected: String,
        actual: String,
    },
    #[error("upload failed. container={container} object={object}: {reason}")]
    Transfer {
        container: String,
        object: String,
        reason: String,
    },
    #[error(
        "segment upload failed. container={container} object={object} segment_index={segment_index}: {reason}"
    )]
    SegmentTransfer {
        container: String,
        object: String,
        segment_index: u32,
        reason: String,
    },
    #[error("metadata differs. container={container} object={object}: {}", join_discrepancies(.discrepancies))]
    Reconciliation {
        container: String,
        object: String,
        discrepancies: Vec<Discrepancy>,
    },
    #[error("{0}")]
    Config(String),
    #[error("a object references a parent directory. object={0}")]
    DirectoryTraversal(String),
    #[error("stat results are not aligned. source={source_count} destination={destination_count}")]
    StatMismatch {
        source_count: usize,
        destination_count: usize,
    },
}

fn join_discrepancies(discrepancies: &[Discrepancy]) -> String {
    discrepancies
        .iter()
        .map(|discrepancy| discrepancy.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Finds a `MigrateError` anywhere in the chain of an `anyhow::Error`.
pub fn find_migrate_error(e: &anyhow::Error) -> Option<&MigrateError> {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<MigrateError>())
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, anyhow};

    use super::*;

    #[test]
    fn reconciliation_error_lists_every_discrepancy() {
        let error = MigrateError::Reconciliation {
            container: "cwrc".to_string(),
            object: "a:1".to_string(),
            discrepancies: vec![
                Discrepancy::MissingOnDestination {
                    key: "a".to_string(),
                    source_value: "b".to_string(),
                },
                Discrepancy::ValueMismatch {
                    key: "c".to_string(),
                    source_value: "d".to_string(),
                    destination_value: "e".to_string(),
                },
            ],
        };

        assert_eq!(
            error.to_string(),
            "metadata differs. container=cwrc object=a:1: a not present in destination: b; c differs: d <> e"
        );
    }

    #[test]
    fn find_migrate_error_through_context() {
        let e = Err::<(), _>(anyhow!(MigrateError::DirectoryTraversal(
            "../a".to_string()
        )))
        .context("download() failed.")
        .unwrap_err();

        assert_eq!(
            find_migrate_error(&e),
            Some(&MigrateError::DirectoryTraversal("../a".to_string()))
        );
        assert!(find_migrate_error(&anyhow!("other")).is_none());
    }
}
