use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use serde::Serialize;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

use crate::types::metadata::MetadataRecord;

pub mod error;
pub mod metadata;

pub const AUDIT_LOG_HEADER: [&str; 7] = [
    "id",
    "md5sum",
    "sha256sum",
    "uploaded_by",
    "last_updated_at",
    "container_name",
    "notes",
];

/// Result of a metadata query for one object.
#[derive(Debug, Clone, PartialEq)]
pub struct StatResult {
    pub object: String,
    pub success: bool,
    pub headers: MetadataRecord,
    pub error: Option<String>,
}

/// Result of downloading one object into the staging directory.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub object: String,
    pub success: bool,
    pub path: Option<PathBuf>,
    pub headers: MetadataRecord,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    UploadObject,
    UploadSegment,
}

impl fmt::Display for UploadAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UploadAction::UploadObject => write!(f, "upload_object"),
            UploadAction::UploadSegment => write!(f, "upload_segment"),
        }
    }
}

/// Result of one write against the destination.
///
/// A segmented upload yields one `UploadSegment` result per segment, followed
/// by a single `UploadObject` result for the assembled object.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    pub action: UploadAction,
    pub success: bool,
    pub container: String,
    pub object: String,
    pub path: PathBuf,
    pub headers: MetadataRecord,
    pub error: Option<String>,
    pub segment_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub path: PathBuf,
    pub object_name: String,
    pub headers: MetadataRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumPair {
    pub md5sum: String,
    pub sha256sum: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub id: String,
    pub md5sum: String,
    pub sha256sum: String,
    pub uploaded_by: String,
    pub last_updated_at: String,
    pub container_name: String,
    pub notes: String,
}

/// Lifecycle of one identifier inside the batch driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemState {
    Pending,
    Fetched,
    PreVerified,
    Transferred,
    PostVerified,
    Reconciled,
    Logged,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemState::Pending => "pending",
            ItemState::Fetched => "fetched",
            ItemState::PreVerified => "pre_verified",
            ItemState::Transferred => "transferred",
            ItemState::PostVerified => "post_verified",
            ItemState::Reconciled => "reconciled",
            ItemState::Logged => "logged",
        };
        write!(f, "{name}")
    }
}

/// An identifier that stopped short of `Logged`. `state` is the last state it
/// reached.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedObject {
    pub object: String,
    pub state: ItemState,
    pub reason: String,
}

#[derive(Debug, PartialEq)]
pub enum MigrationStatistics {
    MigrateStart { key: String },
    MigrateBytes(u64),
    MigrateComplete { key: String },
    MigrateError { key: String },
    IntegrityVerified { key: String },
    MetadataMatched { key: String },
    MetadataMismatched { key: String },
}

#[derive(Debug, Clone)]
pub enum S3Credentials {
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys = f.debug_struct("AccessKeys");
        let session_token = self
            .session_token
            .as_ref()
            .map_or("None", |_| "** redacted **");
        keys.field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &session_token);
        keys.finish()
    }
}
