use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result, anyhow};
use async_channel::Sender;
use tracing::{debug, info, info_span, trace, warn};

use crate::config::{Config, Mode};
use crate::pipeline::audit_logger::AuditLogger;
use crate::pipeline::preparer::prepare;
use crate::pipeline::reconciler::{PairOutcome, ReconcilePolicy, reconcile_batch};
use crate::storage::Storage;
use crate::storage::e_tag_verify::{is_segmented_e_tag, verify_e_tag, verify_e_tag_with_segments};
use crate::types::error::MigrateError;
use crate::types::metadata::{CONTENT_LENGTH_HEADER, MetadataRecord};
use crate::types::{
    ChecksumPair, FetchResult, ItemState, MigrationStatistics, TransferRequest, UploadAction,
    UploadResult,
};

/// Why one identifier failed, and how far it got.
#[derive(Debug)]
pub struct ItemFailure {
    pub state: ItemState,
    pub error: Error,
}

/// Drives one identifier through
/// `Pending → Fetched → PreVerified → Transferred → PostVerified → Reconciled → Logged`.
pub struct ObjectMigrator<'a> {
    config: &'a Config,
    source: &'a Storage,
    target: &'a Storage,
    stats_sender: Sender<MigrationStatistics>,
}

struct Fetched {
    path: PathBuf,
    headers: MetadataRecord,
}

impl<'a> ObjectMigrator<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a Storage,
        target: &'a Storage,
        stats_sender: Sender<MigrationStatistics>,
    ) -> Self {
        ObjectMigrator {
            config,
            source,
            target,
            stats_sender,
        }
    }

    /// Returns the checksums of the migrated object. On failure the staged
    /// file, if any, is left in place.
    pub async fn migrate(
        &self,
        object: &str,
        audit_logger: Option<&mut AuditLogger>,
    ) -> Result<ChecksumPair, ItemFailure> {
        let mut state = ItemState::Pending;

        let result = self.drive(object, &mut state, audit_logger).await;
        result.map_err(|error| ItemFailure { state, error })
    }

    async fn drive(
        &self,
        object: &str,
        state: &mut ItemState,
        audit_logger: Option<&mut AuditLogger>,
    ) -> Result<ChecksumPair> {
        let fetched = self.fetch(object).await?;
        self.transition(object, state, ItemState::Fetched);

        let source_e_tag = fetched.headers.etag().ok_or_else(|| {
            anyhow!(MigrateError::Fetch {
                object: object.to_string(),
                reason: "source advertised no content tag".to_string(),
            })
        })?;
        // the part size of a segmented source upload is unknown
        if is_segmented_e_tag(source_e_tag) {
            return Err(anyhow!(MigrateError::Fetch {
                object: object.to_string(),
                reason: format!("segmented source tag cannot be verified. e_tag={source_e_tag}"),
            }));
        }
        verify_e_tag(&fetched.path, source_e_tag, object).await?;
        self.transition(object, state, ItemState::PreVerified);

        let request = prepare(
            object,
            &fetched.path,
            &fetched.headers,
            self.config.source_system(),
        );
        let uploaded = self.transfer(object, request).await?;
        self.transition(object, state, ItemState::Transferred);

        let destination_e_tag = uploaded.headers.etag().ok_or_else(|| {
            anyhow!(MigrateError::Transfer {
                container: self.config.container_dst.clone(),
                object: object.to_string(),
                reason: "destination advertised no content tag".to_string(),
            })
        })?;
        let checksums = verify_e_tag_with_segments(
            &uploaded.path,
            destination_e_tag,
            self.config.transfer_config.segment_size,
            object,
        )
        .await?;
        self.send_stats(MigrationStatistics::IntegrityVerified {
            key: object.to_string(),
        })
        .await;
        self.transition(object, state, ItemState::PostVerified);

        self.reconcile(object).await?;
        self.transition(object, state, ItemState::Reconciled);

        match (audit_logger, &self.config.mode) {
            (Some(audit_logger), Mode::Migrate { uploaded_by, .. }) => {
                audit_logger
                    .record(&uploaded, &checksums, uploaded_by)
                    .context("audit log write failed.")?;
            }
            _ => trace!(key = object, "audit log disabled."),
        }
        remove_staged_file(&fetched.path, object).await;
        self.transition(object, state, ItemState::Logged);

        Ok(checksums)
    }

    async fn fetch(&self, object: &str) -> Result<Fetched> {
        let results = self
            .source
            .download(&self.config.container_src, &[object.to_string()])
            .await;

        let fetched = take_single_result(results, object)?;
        if !fetched.success {
            return Err(anyhow!(MigrateError::Fetch {
                object: object.to_string(),
                reason: fetched
                    .error
                    .unwrap_or_else(|| "unknown error".to_string()),
            }));
        }

        let path = fetched.path.ok_or_else(|| {
            anyhow!(MigrateError::Fetch {
                object: object.to_string(),
                reason: "no local path reported".to_string(),
            })
        })?;

        Ok(Fetched {
            path,
            headers: fetched.headers,
        })
    }

    async fn transfer(
        &self,
        object: &str,
        request: TransferRequest,
    ) -> Result<UploadResult> {
        let container = &self.config.container_dst;
        let results = self.target.upload(container, vec![request]).await;

        for result in results {
            match (result.action, result.success) {
                (UploadAction::UploadSegment, true) => {
                    trace!(
                        key = object,
                        segment_index = result.segment_index,
                        "segment uploaded."
                    );
                }
                (UploadAction::UploadSegment, false) => {
                    return Err(anyhow!(MigrateError::SegmentTransfer {
                        container: container.clone(),
                        object: object.to_string(),
                        segment_index: result.segment_index.unwrap_or_default(),
                        reason: result.error.unwrap_or_else(|| "unknown error".to_string()),
                    }));
                }
                (UploadAction::UploadObject, false) => {
                    return Err(anyhow!(MigrateError::Transfer {
                        container: container.clone(),
                        object: object.to_string(),
                        reason: result.error.unwrap_or_else(|| "unknown error".to_string()),
                    }));
                }
                (UploadAction::UploadObject, true) => {
                    let size = result
                        .headers
                        .get(CONTENT_LENGTH_HEADER)
                        .and_then(|length| length.parse::<u64>().ok())
                        .unwrap_or_default();
                    self.send_stats(MigrationStatistics::MigrateBytes(size)).await;

                    info!(
                        container = container,
                        key = object,
                        size = size,
                        "object transferred."
                    );
                    return Ok(result);
                }
            }
        }

        Err(anyhow!(MigrateError::Transfer {
            container: container.clone(),
            object: object.to_string(),
            reason: "no upload result reported".to_string(),
        }))
    }

    async fn reconcile(&self, object: &str) -> Result<()> {
        let ids = [object.to_string()];
        let source_results = self.source.stat(&self.config.container_src, &ids).await;
        let destination_results = self.target.stat(&self.config.container_dst, &ids).await;

        let policy =
            ReconcilePolicy::new(self.config.exception_set(), self.config.source_system());

        let outcomes = info_span!("reconcile", key = object).in_scope(|| {
            reconcile_batch(&source_results, &destination_results, &policy)
        })?;

        for outcome in outcomes {
            match outcome {
                PairOutcome::Compared { discrepancies, .. } if discrepancies.is_empty() => {
                    self.send_stats(MigrationStatistics::MetadataMatched {
                        key: object.to_string(),
                    })
                    .await;
                }
                PairOutcome::Compared { discrepancies, .. } => {
                    self.send_stats(MigrationStatistics::MetadataMismatched {
                        key: object.to_string(),
                    })
                    .await;

                    return Err(anyhow!(MigrateError::Reconciliation {
                        container: self.config.container_dst.clone(),
                        object: object.to_string(),
                        discrepancies,
                    }));
                }
                PairOutcome::StatFailed { error, .. } => {
                    return Err(anyhow!(MigrateError::Fetch {
                        object: object.to_string(),
                        reason: error,
                    }));
                }
            }
        }

        Ok(())
    }

    fn transition(&self, object: &str, state: &mut ItemState, next: ItemState) {
        debug!(key = object, from = %state, to = %next, "state changed.");
        *state = next;
    }

    async fn send_stats(&self, stats: MigrationStatistics) {
        let _ = self.stats_sender.send(stats).await;
    }
}

fn take_single_result(results: Vec<FetchResult>, object: &str) -> Result<FetchResult> {
    results
        .into_iter()
        .find(|result| result.object == object)
        .ok_or_else(|| {
            anyhow!(MigrateError::Fetch {
                object: object.to_string(),
                reason: "no download result reported".to_string(),
            })
        })
}

/// Deletes a staged file. Failure is only logged.
async fn remove_staged_file(path: &Path, object: &str) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            trace!(
                key = object,
                path = path.display().to_string(),
                "staged file removed."
            );
        }
        Err(e) => {
            warn!(
                key = object,
                path = path.display().to_string(),
                error = e.to_string(),
                "failed to remove staged file."
            );
        }
    }
}
