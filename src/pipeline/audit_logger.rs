use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::types::error::MigrateError;
use crate::types::{AUDIT_LOG_HEADER, AuditRecord, ChecksumPair, UploadResult};

/// Append-only CSV log of verified uploads. Each row is on disk before
/// `record` returns.
pub struct AuditLogger {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl AuditLogger {
    /// Creates (or truncates) the log and writes the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            anyhow!(MigrateError::Config(format!(
                "failed to create audit log {}: {e}",
                path.display()
            )))
        })?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(AUDIT_LOG_HEADER)
            .context("csv::Writer::write_record() failed.")?;

        let mut logger = AuditLogger {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        };
        logger.sync()?;

        info!(path = path.display().to_string(), "audit log created.");

        Ok(logger)
    }

    pub fn record(
        &mut self,
        uploaded: &UploadResult,
        checksums: &ChecksumPair,
        uploaded_by: &str,
    ) -> Result<AuditRecord> {
        let record = AuditRecord {
            id: uploaded.object.clone(),
            md5sum: checksums.md5sum.clone(),
            sha256sum: checksums.sha256sum.clone(),
            uploaded_by: uploaded_by.to_string(),
            last_updated_at: uploaded
                .headers
                .last_modified()
                .unwrap_or_default()
                .to_string(),
            container_name: uploaded.container.clone(),
            notes: String::new(),
        };

        self.writer
            .serialize(&record)
            .context("csv::Writer::serialize() failed.")?;
        self.sync()?;
        self.rows += 1;

        debug!(
            key = record.id,
            path = self.path.display().to_string(),
            "audit record written."
        );

        Ok(record)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn sync(&mut self) -> Result<()> {
        self.writer.flush().context("csv::Writer::flush() failed.")?;
        self.writer
            .get_ref()
            .sync_data()
            .context("File::sync_data() failed.")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UploadAction;
    use crate::types::error::find_migrate_error;
    use crate::types::metadata::MetadataRecord;

    fn uploaded(object: &str) -> UploadResult {
        UploadResult {
            action: UploadAction::UploadObject,
            success: true,
            container: "dst".to_string(),
            object: object.to_string(),
            path: PathBuf::from("/tmp").join(object),
            headers: [("last-modified", "Thu, 01 Jan 1970 00:00:00 GMT")]
                .into_iter()
                .collect::<MetadataRecord>(),
            error: None,
            segment_index: None,
        }
    }

    fn checksums() -> ChecksumPair {
        ChecksumPair {
            md5sum: "5eb63bbbe01eeed093cb22bb8f5acdc3".to_string(),
            sha256sum: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
                .to_string(),
        }
    }

    #[test]
    fn header_written_at_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");

        let logger = AuditLogger::create(&path).unwrap();

        assert_eq!(logger.rows(), 0);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "id,md5sum,sha256sum,uploaded_by,last_updated_at,container_name,notes\n"
        );
    }

    #[test]
    fn each_record_appends_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");

        let mut logger = AuditLogger::create(&path).unwrap();
        let record = logger.record(&uploaded("a:1"), &checksums(), "operator").unwrap();
        assert_eq!(record.container_name, "dst");
        assert_eq!(record.notes, "");

        // visible on disk without dropping the logger
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "a:1,5eb63bbbe01eeed093cb22bb8f5acdc3,b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9,operator,\"Thu, 01 Jan 1970 00:00:00 GMT\",dst,"
        );

        logger.record(&uploaded("a:2"), &checksums(), "operator").unwrap();
        assert_eq!(logger.rows(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn create_truncates_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        std::fs::write(&path, "stale\n").unwrap();

        AuditLogger::create(&path).unwrap();

        assert!(!std::fs::read_to_string(&path).unwrap().contains("stale"));
    }

    #[test]
    fn create_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();

        let e = AuditLogger::create(&dir.path().join("no_such_dir").join("audit.csv"))
            .err()
            .unwrap();
        assert!(matches!(
            find_migrate_error(&e),
            Some(MigrateError::Config(message)) if message.starts_with("failed to create audit log")
        ));
    }
}
