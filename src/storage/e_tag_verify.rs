use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, trace};

use crate::storage::checksum::Checksum;
use crate::storage::checksum::md5::{ChecksumMd5, ChecksumSegmentedMd5};
use crate::storage::checksum::sha256::ChecksumSha256;
use crate::types::ChecksumPair;
use crate::types::error::MigrateError;

const CHECKSUM_CHUNK_SIZE: usize = 64 * 1024;

/// Streams `path` once and returns its MD5 and SHA-256 hex digests.
pub async fn file_checksum(path: &Path) -> Result<ChecksumPair> {
    let (checksums, _) = compute_checksums(path, None).await?;
    Ok(checksums)
}

/// Verifies that the MD5 of `path` equals `expected_e_tag`.
///
/// The SHA-256 is computed alongside for the audit trail but never takes part
/// in the decision.
pub async fn verify_e_tag(
    path: &Path,
    expected_e_tag: &str,
    object: &str,
) -> Result<ChecksumPair> {
    let expected = normalize_e_tag(expected_e_tag);
    let checksums = file_checksum(path).await?;

    compare(path, object, &expected, &checksums.md5sum)?;

    debug!(
        key = object,
        md5sum = checksums.md5sum,
        "checksum verified."
    );

    Ok(checksums)
}

/// Like `verify_e_tag`, but a segmented tag (`<hex>-<n>`) is checked against
/// the composite MD5 of `segment_size` segments.
pub async fn verify_e_tag_with_segments(
    path: &Path,
    expected_e_tag: &str,
    segment_size: u64,
    object: &str,
) -> Result<ChecksumPair> {
    let expected = normalize_e_tag(expected_e_tag);
    if !is_segmented_e_tag(&expected) {
        return verify_e_tag(path, &expected, object).await;
    }

    let (checksums, composite) = compute_checksums(path, Some(segment_size)).await?;
    let composite = composite.unwrap_or_default();

    compare(path, object, &expected, &composite)?;

    debug!(
        key = object,
        e_tag = composite,
        md5sum = checksums.md5sum,
        "segmented checksum verified."
    );

    Ok(checksums)
}

pub fn normalize_e_tag(e_tag: &str) -> String {
    e_tag.trim().replace('"', "").to_ascii_lowercase()
}

pub fn is_segmented_e_tag(e_tag: &str) -> bool {
    match normalize_e_tag(e_tag).split_once('-') {
        Some((digest, count)) => {
            !digest.is_empty()
                && digest.chars().all(|c| c.is_ascii_hexdigit())
                && !count.is_empty()
                && count.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn compare(path: &Path, object: &str, expected: &str, actual: &str) -> Result<()> {
    if expected == actual {
        return Ok(());
    }

    Err(anyhow!(MigrateError::Integrity {
        object: object.to_string(),
        path: path.to_string_lossy().to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }))
}

async fn compute_checksums(
    path: &Path,
    segment_size: Option<u64>,
) -> Result<(ChecksumPair, Option<String>)> {
    let mut file = File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut md5 = ChecksumMd5::default();
    let mut sha256 = ChecksumSha256::default();
    let mut segmented = segment_size.map(ChecksumSegmentedMd5::new);

    let mut buffer = vec![0u8; CHECKSUM_CHUNK_SIZE];
    let mut total_bytes = 0u64;
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }

        md5.update(&buffer[..read]);
        sha256.update(&buffer[..read]);
        if let Some(segmented) = segmented.as_mut() {
            segmented.update(&buffer[..read]);
        }
        total_bytes += read as u64;
    }

    trace!(path = path.display().to_string(), total_bytes, "checksum computed.");

    Ok((
        ChecksumPair {
            md5sum: md5.finalize(),
            sha256sum: sha256.finalize(),
        },
        segmented.as_mut().map(|segmented| segmented.finalize()),
    ))
}
