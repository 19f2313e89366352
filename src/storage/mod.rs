use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::trace;

use crate::config::{ClientConfig, TransferConfig};
use crate::types::error::MigrateError;
use crate::types::{FetchResult, StatResult, TransferRequest, UploadResult};

pub mod checksum;
pub mod e_tag_verify;
pub mod memory;
pub mod s3;

pub type Storage = Box<dyn StorageTrait + Send + Sync>;

pub struct StoragePair {
    pub source: Storage,
    pub target: Storage,
}

#[async_trait]
pub trait StorageFactory {
    async fn create(
        client_config: &ClientConfig,
        staging_dir: &Path,
        transfer_config: TransferConfig,
    ) -> Storage;
}

/// Object storage as seen by the pipeline.
///
/// Every operation is batched and reports failures per object in its result
/// records, so one bad object never hides the outcome of the others. Results
/// are returned in request order.
#[async_trait]
pub trait StorageTrait {
    async fn stat(&self, container: &str, objects: &[String]) -> Vec<StatResult>;

    /// Downloads each object into the staging directory of this storage.
    async fn download(&self, container: &str, objects: &[String]) -> Vec<FetchResult>;

    /// Writes each request. Segmented uploads report one `UploadSegment`
    /// result per segment before the `UploadObject` result.
    async fn upload(&self, container: &str, requests: Vec<TransferRequest>) -> Vec<UploadResult>;
}

pub fn check_directory_traversal(object: &str) -> bool {
    Path::new(object)
        .components()
        .any(|component| matches!(component, Component::ParentDir))
}

/// Local path an object is staged at. Absolute object names are re-rooted
/// under `staging_dir`.
pub fn staging_path(staging_dir: &Path, object: &str) -> Result<PathBuf> {
    if check_directory_traversal(object) {
        return Err(anyhow!(MigrateError::DirectoryTraversal(object.to_string())));
    }

    let relative: PathBuf = Path::new(object)
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect();
    if relative.as_os_str().is_empty() {
        return Err(anyhow!("object name has no file component. object={object}"));
    }

    Ok(staging_dir.join(relative))
}

pub async fn create_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("tokio::fs::create_dir_all() failed.")?;

        trace!(directory = parent.display().to_string(), "directory created.");
    }

    Ok(())
}
