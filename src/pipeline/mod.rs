use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_channel::{Receiver, Sender};
use tracing::{error, info, trace, warn};

use crate::Config;
use crate::config::Mode;
use crate::pipeline::audit_logger::AuditLogger;
use crate::pipeline::auditor::ObjectAuditor;
use crate::pipeline::migrator::{ItemFailure, ObjectMigrator};
use crate::storage::{Storage, StoragePair};
use crate::types::{FailedObject, MigrationStatistics};

pub mod audit_logger;
pub mod auditor;
pub mod id_list;
pub mod migrator;
pub mod preparer;
pub mod reconciler;
mod storage_factory;

/// Batch driver. Processes the identifier list strictly in file order, one
/// identifier at a time.
pub struct Pipeline {
    config: Config,
    source: Storage,
    target: Storage,
    stats_sender: Sender<MigrationStatistics>,
    stats_receiver: Receiver<MigrationStatistics>,
    has_error: Arc<AtomicBool>,
    has_warning: Arc<AtomicBool>,
    errors: Arc<Mutex<VecDeque<Error>>>,
    failed_objects: Arc<Mutex<Vec<FailedObject>>>,
    ready: bool,
}

impl Pipeline {
    /// Connects to the S3 endpoints described by `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let storage_pair = storage_factory::create_storage_pair(&config).await?;
        Ok(Self::with_storage(config, storage_pair))
    }

    pub fn with_storage(config: Config, storage_pair: StoragePair) -> Self {
        let StoragePair { source, target } = storage_pair;
        let (stats_sender, stats_receiver) = async_channel::unbounded();

        Self {
            config,
            source,
            target,
            stats_sender,
            stats_receiver,
            has_error: Arc::new(AtomicBool::new(false)),
            has_warning: Arc::new(AtomicBool::new(false)),
            errors: Arc::new(Mutex::new(VecDeque::<Error>::new())),
            failed_objects: Arc::new(Mutex::new(Vec::new())),
            ready: true,
        }
    }

    pub async fn run(&mut self) {
        if !self.ready {
            panic!("it can be executed only once.")
        }
        self.ready = false;

        let ids = match id_list::read_id_list(&self.config.id_list).await {
            Ok(ids) => ids,
            Err(e) => {
                self.print_and_store_error(e, "failed to read the id list.");
                self.shutdown();
                return;
            }
        };

        info!(
            mode = self.config.mode.name(),
            container_src = self.config.container_src,
            container_dst = self.config.container_dst,
            ids = ids.len(),
            "pipeline started."
        );

        match self.config.mode {
            Mode::Copy | Mode::Migrate { .. } => self.migrate(&ids).await,
            Mode::Audit => self.audit(&ids).await,
        }

        self.shutdown();
    }

    async fn migrate(&self, ids: &[String]) {
        let mut audit_logger = match self.config.audit_log_path() {
            Some(database_csv) => match AuditLogger::create(database_csv) {
                Ok(audit_logger) => Some(audit_logger),
                Err(e) => {
                    self.print_and_store_error(e, "failed to create the audit log.");
                    return;
                }
            },
            None => None,
        };

        let migrator = ObjectMigrator::new(
            &self.config,
            &self.source,
            &self.target,
            self.stats_sender.clone(),
        );

        for (index, object) in ids.iter().enumerate() {
            self.send_stats(MigrationStatistics::MigrateStart {
                key: object.clone(),
            })
            .await;

            match migrator.migrate(object, audit_logger.as_mut()).await {
                Ok(checksums) => {
                    info!(
                        key = object,
                        md5sum = checksums.md5sum,
                        sha256sum = checksums.sha256sum,
                        "migration completed."
                    );
                    self.send_stats(MigrationStatistics::MigrateComplete {
                        key: object.clone(),
                    })
                    .await;
                }
                Err(failure) => {
                    self.send_stats(MigrationStatistics::MigrateError {
                        key: object.clone(),
                    })
                    .await;
                    self.record_failure(object, failure);

                    if self.config.mode == Mode::Copy {
                        let remaining = ids.len() - index - 1;
                        error!(remaining = remaining, "aborting the batch.");
                        return;
                    }
                }
            }
        }

        if let Some(audit_logger) = audit_logger {
            info!(rows = audit_logger.rows(), "audit log closed.");
        }
    }

    async fn audit(&self, ids: &[String]) {
        let auditor = ObjectAuditor::new(
            &self.config,
            &self.source,
            &self.target,
            self.stats_sender.clone(),
        );
        let interval = Duration::from_millis(self.config.audit_interval_milliseconds);

        for (index, object) in ids.iter().enumerate() {
            if 0 < index && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }

            self.send_stats(MigrationStatistics::MigrateStart {
                key: object.clone(),
            })
            .await;

            let report = auditor.audit(object).await;
            self.send_stats(MigrationStatistics::MigrateComplete {
                key: object.clone(),
            })
            .await;
            if !report.is_clean() {
                self.has_warning.store(true, Ordering::SeqCst);
                warn!(
                    key = object,
                    discrepancies = report.discrepancies.len(),
                    stat_errors = report.stat_errors.len(),
                    "audit found problems."
                );
            }
        }
    }

    fn record_failure(&self, object: &str, failure: ItemFailure) {
        let ItemFailure { state, error } = failure;
        let reason = format!("{error:#}");

        error!(
            key = object,
            state = %state,
            error = reason,
            "migration failed."
        );

        self.failed_objects.lock().unwrap().push(FailedObject {
            object: object.to_string(),
            state,
            reason,
        });
        self.has_error.store(true, Ordering::SeqCst);
        self.errors.lock().unwrap().push_back(error);
    }

    fn print_and_store_error(&self, e: Error, message: &str) {
        self.has_error.store(true, Ordering::SeqCst);

        let error = format!("{e:#}");
        error!(error = error, message);

        self.errors
            .lock()
            .unwrap()
            .push_back(e.context(message.to_string()));
    }

    fn shutdown(&self) {
        trace!("pipeline shutdown.");
        self.close_stats_sender();
    }

    async fn send_stats(&self, stats: MigrationStatistics) {
        let _ = self.stats_sender.send(stats).await;
    }

    pub fn get_stats_receiver(&self) -> Receiver<MigrationStatistics> {
        self.stats_receiver.clone()
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    pub fn has_warning(&self) -> bool {
        self.has_warning.load(Ordering::SeqCst)
    }

    pub fn get_failed_objects(&self) -> Vec<FailedObject> {
        self.failed_objects.lock().unwrap().clone()
    }

    pub fn get_errors_and_consume(&self) -> Option<Vec<Error>> {
        if !self.has_error() {
            return None;
        }

        let mut error_list = self.errors.lock().unwrap();
        Some(error_list.drain(..).collect())
    }

    pub fn close_stats_sender(&self) {
        self.stats_sender.close();
    }
}

/// First error of a finished pipeline, for reporting.
pub fn first_error(errors: Option<Vec<Error>>) -> Error {
    errors
        .and_then(|errors| errors.into_iter().next())
        .unwrap_or_else(|| anyhow!("Unknown error"))
}
