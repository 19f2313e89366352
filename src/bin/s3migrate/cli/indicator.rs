use std::io;
use std::io::Write;

use async_channel::Receiver;
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};
use s3migrate::types::MigrationStatistics;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

const REFRESH_INTERVAL: f32 = 1.0;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MigrationSummary {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub transferred_bytes: u64,
    pub integrity_verified: u64,
    pub metadata_matched: u64,
    pub metadata_mismatched: u64,
}

impl MigrationSummary {
    fn update(&mut self, stats: MigrationStatistics) -> Option<String> {
        match stats {
            MigrationStatistics::MigrateStart { key } => {
                self.started += 1;
                return Some(key);
            }
            MigrationStatistics::MigrateBytes(size) => self.transferred_bytes += size,
            MigrationStatistics::MigrateComplete { .. } => self.completed += 1,
            MigrationStatistics::MigrateError { .. } => self.failed += 1,
            MigrationStatistics::IntegrityVerified { .. } => self.integrity_verified += 1,
            MigrationStatistics::MetadataMatched { .. } => self.metadata_matched += 1,
            MigrationStatistics::MetadataMismatched { .. } => self.metadata_mismatched += 1,
        }

        None
    }

    fn message(&self) -> String {
        format!(
            "{:>3} transferred,  completed {} objects,  integrity verified {} objects,  metadata matched {} objects,  metadata mismatched {} objects,  failed {} objects",
            HumanBytes(self.transferred_bytes),
            self.completed,
            self.integrity_verified,
            self.metadata_matched,
            self.metadata_mismatched,
            self.failed,
        )
    }
}

/// Consumes pipeline statistics until the channel is closed. Resolves to the
/// totals.
pub fn show_indicator(
    stats_receiver: Receiver<MigrationStatistics>,
    show_progress: bool,
    show_result: bool,
    log_summary: bool,
) -> JoinHandle<MigrationSummary> {
    let progress_text = ProgressBar::new(0);
    if let Ok(progress_style) = ProgressStyle::with_template("{wide_msg}") {
        progress_text.set_style(progress_style);
    }

    tokio::spawn(async move {
        let start_time = Instant::now();
        let mut summary = MigrationSummary::default();
        let mut current_object = String::new();

        loop {
            let period = Instant::now();
            loop {
                while let Ok(stats) = stats_receiver.try_recv() {
                    if let Some(object) = summary.update(stats) {
                        current_object = object;
                    }
                }

                if REFRESH_INTERVAL < period.elapsed().as_secs_f32() {
                    break;
                }

                if stats_receiver.is_closed() && stats_receiver.is_empty() {
                    let elapsed = start_time.elapsed();

                    if log_summary {
                        info!(
                            message = "migration summary",
                            started = summary.started,
                            completed = summary.completed,
                            failed = summary.failed,
                            transferred_byte = summary.transferred_bytes,
                            integrity_verified = summary.integrity_verified,
                            metadata_matched = summary.metadata_matched,
                            metadata_mismatched = summary.metadata_mismatched,
                            duration_sec = elapsed.as_secs_f64(),
                        );
                    }

                    if show_result {
                        if let Ok(progress_style) = ProgressStyle::with_template("{msg}") {
                            progress_text.set_style(progress_style);
                        }
                        progress_text.finish_with_message(format!(
                            "{},  duration {}",
                            summary.message(),
                            HumanDuration(elapsed),
                        ));

                        println!();
                        let _ = io::stdout().flush();
                    } else {
                        progress_text.finish_and_clear();
                    }

                    return summary;
                }

                tokio::time::sleep(std::time::Duration::from_secs_f32(0.05)).await;
            }

            if show_progress {
                progress_text.set_message(format!(
                    "[{}/{}] {} | {}",
                    summary.completed + summary.failed,
                    summary.started,
                    current_object,
                    summary.message(),
                ));
            }
        }
    })
}
