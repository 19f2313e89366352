#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use s3migrate::Config;
use s3migrate::config::{Mode, TransferConfig};
use s3migrate::pipeline::Pipeline;
use s3migrate::storage::StoragePair;
use s3migrate::storage::memory::MemoryStorage;
use s3migrate::types::MigrationStatistics;
use s3migrate::types::metadata::MetadataRecord;

pub const LEGACY_CONTAINER: &str = "CWRC";
pub const DESTINATION_CONTAINER: &str = "cwrc";
pub const UPLOADED_BY: &str = "operator";

pub const SEGMENT_SIZE: u64 = 5 * 1024 * 1024;

pub struct TestHelper {
    pub dir: TempDir,
    pub source: MemoryStorage,
    pub target: MemoryStorage,
}

impl TestHelper {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = MemoryStorage::new(dir.path());
        let target = MemoryStorage::new(dir.path());

        Self {
            dir,
            source,
            target,
        }
    }

    pub fn with_target_segment_size(segment_size: u64) -> Self {
        let helper = Self::new();
        let target = MemoryStorage::new(helper.dir.path()).with_segment_size(segment_size);

        Self { target, ..helper }
    }

    pub fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .or_else(|_| EnvFilter::try_new("dummy=trace"))
                    .unwrap(),
            )
            .try_init();
    }

    /// The legacy archive used throughout: a zip stored as `application/x-tar`.
    pub fn legacy_headers() -> MetadataRecord {
        [
            ("content-type", "application/x-tar"),
            ("x-object-meta-project-id", "a"),
            ("x-object-meta-aip-version", "b"),
            ("x-object-meta-project", "c"),
            ("x-object-meta-promise", "d"),
            ("x-object-meta-last-mod-timestamp", "1561507200"),
        ]
        .into_iter()
        .collect()
    }

    pub fn put_source(&self, object: &str, data: &[u8], headers: MetadataRecord) {
        self.source.put(LEGACY_CONTAINER, object, data, headers);
    }

    pub fn database_csv(&self) -> PathBuf {
        self.dir.path().join("audit.csv")
    }

    pub fn staged_path(&self, object: &str) -> PathBuf {
        self.dir.path().join(object)
    }

    pub fn config(&self, mode: Mode, ids: &[&str]) -> Config {
        let id_list = self.dir.path().join("ids.txt");
        let content: String = ids.iter().map(|id| format!("{id}\n")).collect();
        std::fs::write(&id_list, content).unwrap();

        Config {
            mode,
            id_list,
            tmp_dir: self.dir.path().to_path_buf(),
            container_src: LEGACY_CONTAINER.to_string(),
            container_dst: DESTINATION_CONTAINER.to_string(),
            source_client_config: None,
            target_client_config: None,
            tracing_config: None,
            transfer_config: TransferConfig {
                segment_size: SEGMENT_SIZE,
            },
            exception_headers: vec![],
            audit_interval_milliseconds: 0,
        }
    }

    pub fn migrate_mode(&self) -> Mode {
        Mode::Migrate {
            uploaded_by: UPLOADED_BY.to_string(),
            database_csv: self.database_csv(),
        }
    }

    pub async fn run(&self, config: Config) -> Pipeline {
        let storage_pair = StoragePair {
            source: Box::new(self.source.clone()),
            target: Box::new(self.target.clone()),
        };

        let mut pipeline = Pipeline::with_storage(config, storage_pair);
        pipeline.run().await;
        pipeline
    }

    pub fn audit_log_rows(&self) -> Vec<csv::StringRecord> {
        let mut reader = csv::Reader::from_path(self.database_csv()).unwrap();
        reader.records().map(|record| record.unwrap()).collect()
    }

    pub fn audit_log_header(&self) -> Vec<String> {
        let mut reader = csv::Reader::from_path(self.database_csv()).unwrap();
        reader
            .headers()
            .unwrap()
            .iter()
            .map(|field| field.to_string())
            .collect()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

pub fn collect_stats(pipeline: &Pipeline) -> Vec<MigrationStatistics> {
    let stats_receiver = pipeline.get_stats_receiver();
    let mut stats = Vec::new();
    while let Ok(stat) = stats_receiver.try_recv() {
        stats.push(stat);
    }
    stats
}

pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::Digest;
    hex::encode(sha2::Sha256::digest(data))
}
