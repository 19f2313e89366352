use async_channel::Sender;
use tracing::{error, info, info_span};

use crate::config::Config;
use crate::pipeline::reconciler::{PairOutcome, ReconcilePolicy, reconcile_batch};
use crate::storage::Storage;
use crate::types::MigrationStatistics;
use crate::types::metadata::Discrepancy;

/// Result of auditing one identifier. Auditing never fails; problems are
/// reported here and in the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditReport {
    pub discrepancies: Vec<Discrepancy>,
    pub stat_errors: Vec<String>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty() && self.stat_errors.is_empty()
    }
}

/// Read-only comparison of an identifier on both sides.
pub struct ObjectAuditor<'a> {
    config: &'a Config,
    source: &'a Storage,
    target: &'a Storage,
    stats_sender: Sender<MigrationStatistics>,
}

impl<'a> ObjectAuditor<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a Storage,
        target: &'a Storage,
        stats_sender: Sender<MigrationStatistics>,
    ) -> Self {
        ObjectAuditor {
            config,
            source,
            target,
            stats_sender,
        }
    }

    pub async fn audit(&self, object: &str) -> AuditReport {
        let ids = [object.to_string()];
        let source_results = self.source.stat(&self.config.container_src, &ids).await;
        let destination_results = self.target.stat(&self.config.container_dst, &ids).await;

        let policy = ReconcilePolicy::new(self.config.exception_set(), self.config.source_system());
        let outcomes = info_span!("audit", key = object)
            .in_scope(|| reconcile_batch(&source_results, &destination_results, &policy));

        let mut report = AuditReport::default();
        match outcomes {
            Ok(outcomes) => {
                for outcome in outcomes {
                    match outcome {
                        PairOutcome::Compared { discrepancies, .. } => {
                            for discrepancy in &discrepancies {
                                error!(
                                    key = object,
                                    header = discrepancy.key(),
                                    "id:[{object}] {discrepancy}"
                                );
                            }
                            report.discrepancies.extend(discrepancies);
                        }
                        PairOutcome::StatFailed { error, .. } => {
                            error!(key = object, "{error}");
                            report.stat_errors.push(error);
                        }
                    }
                }
            }
            Err(e) => {
                error!(key = object, error = e.to_string(), "audit failed.");
                report.stat_errors.push(e.to_string());
            }
        }

        let stats = if report.is_clean() {
            info!(key = object, "metadata matched.");
            MigrationStatistics::MetadataMatched {
                key: object.to_string(),
            }
        } else {
            MigrationStatistics::MetadataMismatched {
                key: object.to_string(),
            }
        };
        let _ = self.stats_sender.send(stats).await;

        report
    }
}
