use std::path::Path;

use tracing::debug;

use crate::types::TransferRequest;
use crate::types::metadata::{
    CONTENT_TYPE_HEADER, MetadataRecord, NORMALIZED_ARCHIVE_CONTENT_TYPE, SourceSystem,
};

/// Source headers carried over to the destination when present.
pub const PROPAGATED_HEADERS: [&str; 5] = [
    "x-object-meta-project-id",
    "x-object-meta-aip-version",
    "x-object-meta-project",
    "x-object-meta-promise",
    CONTENT_TYPE_HEADER,
];

/// Additionally carried over from the legacy source system.
pub const LEGACY_PROPAGATED_HEADERS: [&str; 1] = ["x-object-meta-last-mod-timestamp"];

/// Builds the destination write for a fetched and verified object.
pub fn prepare(
    object: &str,
    path: &Path,
    source_headers: &MetadataRecord,
    source_system: SourceSystem,
) -> TransferRequest {
    let legacy_headers: &[&str] = if source_system.is_legacy() {
        &LEGACY_PROPAGATED_HEADERS
    } else {
        &[]
    };

    let mut headers: MetadataRecord = PROPAGATED_HEADERS
        .iter()
        .chain(legacy_headers)
        .filter_map(|key| source_headers.get(key).map(|value| (*key, value)))
        .collect();

    if source_system.is_legacy() {
        headers.insert(CONTENT_TYPE_HEADER, NORMALIZED_ARCHIVE_CONTENT_TYPE);
    }

    debug!(key = object, headers = headers.len(), "transfer prepared.");

    TransferRequest {
        path: path.to_path_buf(),
        object_name: object.to_string(),
        headers,
    }
}
