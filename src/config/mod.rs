use std::path::{Path, PathBuf};

use crate::types::S3Credentials;
use crate::types::metadata::{ExceptionSet, SourceSystem};

pub mod args;
pub mod source_credentials;

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub id_list: PathBuf,
    pub tmp_dir: PathBuf,
    pub container_src: String,
    pub container_dst: String,
    pub source_client_config: Option<ClientConfig>,
    pub target_client_config: Option<ClientConfig>,
    pub tracing_config: Option<TracingConfig>,
    pub transfer_config: TransferConfig,
    pub exception_headers: Vec<String>,
    pub audit_interval_milliseconds: u64,
}

impl Config {
    pub fn source_system(&self) -> SourceSystem {
        SourceSystem::from_container(&self.container_src)
    }

    /// Baseline exceptions plus `--exception-header` values. Built fresh per call.
    pub fn exception_set(&self) -> ExceptionSet {
        ExceptionSet::with_additional(&self.exception_headers)
    }

    /// The audit log written by `migrate`. Other modes write none.
    pub fn audit_log_path(&self) -> Option<&Path> {
        match &self.mode {
            Mode::Migrate { database_csv, .. } => Some(database_csv.as_path()),
            _ => None,
        }
    }
}

/// What the pipeline does with each identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Plain copy. The first failed identifier aborts the batch.
    Copy,
    /// Audited copy. Failed identifiers are reported and the batch continues.
    Migrate {
        uploaded_by: String,
        database_csv: PathBuf,
    },
    /// Read-only metadata comparison of both sides.
    Audit,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Copy => "copy",
            Mode::Migrate { .. } => "migrate",
            Mode::Audit => "audit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential: S3Credentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub retry_config: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TransferConfig {
    pub segment_size: u64,
}

impl TransferConfig {
    pub fn is_segmented_upload_required(&self, content_length: u64) -> bool {
        self.segment_size <= content_length
    }
}
