use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_smithy_types::DateTime;
use aws_smithy_types::date_time::Format;
use tracing::{debug, trace};

use crate::storage::checksum::Checksum;
use crate::storage::checksum::md5::{ChecksumMd5, ChecksumSegmentedMd5};
use crate::storage::{StorageTrait, create_parent_directory, staging_path};
use crate::types::metadata::{
    CONTENT_LENGTH_HEADER, ETAG_HEADER, LAST_MODIFIED_HEADER, MetadataRecord,
};
use crate::types::{FetchResult, StatResult, TransferRequest, UploadAction, UploadResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Operation {
    Stat,
    Download,
    Upload,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    headers: MetadataRecord,
}

#[derive(Debug, Default)]
struct MemoryState {
    containers: HashMap<String, BTreeMap<String, StoredObject>>,
    failures: HashSet<(Operation, String)>,
    segment_failures: HashMap<String, u32>,
    advertised_e_tags: HashMap<String, String>,
    dropped_headers: Vec<String>,
    upload_count: usize,
}

/// Object storage held in process memory.
///
/// Behaves like the S3 backend as far as the pipeline can observe: stat
/// reports `etag`, `last-modified` and `content-length` alongside the stored
/// headers, and uploads at or above the segment size produce a segmented tag.
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    staging_dir: PathBuf,
    segment_size: Option<u64>,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new(staging_dir: &Path) -> Self {
        MemoryStorage {
            staging_dir: staging_dir.to_path_buf(),
            segment_size: None,
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    pub fn with_segment_size(mut self, segment_size: u64) -> Self {
        assert!(segment_size > 0);
        self.segment_size = Some(segment_size);
        self
    }

    pub fn put(&self, container: &str, object: &str, data: &[u8], headers: MetadataRecord) {
        let stored = self.build_stored_object(data, headers);
        self.lock()
            .containers
            .entry(container.to_string())
            .or_default()
            .insert(object.to_string(), stored);
    }

    pub fn get(&self, container: &str, object: &str) -> Option<(Vec<u8>, MetadataRecord)> {
        self.lock()
            .containers
            .get(container)
            .and_then(|objects| objects.get(object))
            .map(|stored| (stored.data.clone(), stored.headers.clone()))
    }

    pub fn object_count(&self, container: &str) -> usize {
        self.lock()
            .containers
            .get(container)
            .map_or(0, |objects| objects.len())
    }

    /// Number of `upload` requests received, successful or not.
    pub fn upload_count(&self) -> usize {
        self.lock().upload_count
    }

    pub fn fail_stat(&self, object: &str) {
        self.lock()
            .failures
            .insert((Operation::Stat, object.to_string()));
    }

    pub fn fail_download(&self, object: &str) {
        self.lock()
            .failures
            .insert((Operation::Download, object.to_string()));
    }

    pub fn fail_upload(&self, object: &str) {
        self.lock()
            .failures
            .insert((Operation::Upload, object.to_string()));
    }

    pub fn fail_segment(&self, object: &str, segment_index: u32) {
        self.lock()
            .segment_failures
            .insert(object.to_string(), segment_index);
    }

    /// Reports `e_tag` for `object` instead of the tag of its stored content.
    pub fn advertise_e_tag(&self, object: &str, e_tag: &str) {
        self.lock()
            .advertised_e_tags
            .insert(object.to_string(), e_tag.to_string());
    }

    /// Discards `header` from every subsequent upload.
    pub fn drop_header_on_upload(&self, header: &str) {
        self.lock().dropped_headers.push(header.to_ascii_lowercase());
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // a poisoned state only means another test thread panicked
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn build_stored_object(&self, data: &[u8], mut headers: MetadataRecord) -> StoredObject {
        headers.insert(ETAG_HEADER, format!("\"{}\"", self.e_tag(data)));
        headers.insert(CONTENT_LENGTH_HEADER, data.len().to_string());
        headers.insert(LAST_MODIFIED_HEADER, http_date_now());

        StoredObject {
            data: data.to_vec(),
            headers,
        }
    }

    fn e_tag(&self, data: &[u8]) -> String {
        match self.segment_size {
            Some(segment_size) if segment_size <= data.len() as u64 => {
                let mut checksum = ChecksumSegmentedMd5::new(segment_size);
                checksum.update(data);
                checksum.finalize()
            }
            _ => {
                let mut checksum = ChecksumMd5::default();
                checksum.update(data);
                checksum.finalize()
            }
        }
    }

    fn is_failure(&self, operation: Operation, object: &str) -> bool {
        self.lock()
            .failures
            .contains(&(operation, object.to_string()))
    }

    fn stat_object(&self, container: &str, object: &str) -> Result<MetadataRecord> {
        if self.is_failure(Operation::Stat, object) {
            return Err(anyhow!("injected stat failure"));
        }

        let state = self.lock();
        let stored = state
            .containers
            .get(container)
            .and_then(|objects| objects.get(object))
            .ok_or_else(|| anyhow!("object not found"))?;

        let mut headers = stored.headers.clone();
        if let Some(e_tag) = state.advertised_e_tags.get(object) {
            headers.insert(ETAG_HEADER, e_tag.clone());
        }

        Ok(headers)
    }

    async fn download_object(
        &self,
        container: &str,
        object: &str,
    ) -> Result<(PathBuf, MetadataRecord)> {
        if self.is_failure(Operation::Download, object) {
            return Err(anyhow!("injected download failure"));
        }

        let path = staging_path(&self.staging_dir, object)?;
        let headers = self.stat_object(container, object)?;
        let (data, _) = self
            .get(container, object)
            .ok_or_else(|| anyhow!("object not found"))?;

        create_parent_directory(&path).await?;
        tokio::fs::write(&path, &data)
            .await
            .context("tokio::fs::write() failed.")?;

        trace!(key = object, path = path.display().to_string(), "object staged.");

        Ok((path, headers))
    }

    async fn upload_object(
        &self,
        container: &str,
        request: &TransferRequest,
        results: &mut Vec<UploadResult>,
    ) -> Result<MetadataRecord> {
        let data = tokio::fs::read(&request.path)
            .await
            .context("tokio::fs::read() failed.")?;

        if let Some(segment_size) = self.segment_size {
            if segment_size <= data.len() as u64 {
                let failed_segment = self
                    .lock()
                    .segment_failures
                    .get(&request.object_name)
                    .copied();

                for (index, _) in data.chunks(segment_size as usize).enumerate() {
                    let segment_index = index as u32;
                    let failed = failed_segment == Some(segment_index);
                    results.push(UploadResult {
                        action: UploadAction::UploadSegment,
                        success: !failed,
                        container: container.to_string(),
                        object: request.object_name.clone(),
                        path: request.path.clone(),
                        headers: MetadataRecord::new(),
                        error: failed.then(|| "injected segment failure".to_string()),
                        segment_index: Some(segment_index),
                    });

                    if failed {
                        return Err(anyhow!("segment upload failed. segment_index={segment_index}"));
                    }
                }
            }
        }

        if self.is_failure(Operation::Upload, &request.object_name) {
            return Err(anyhow!("injected upload failure"));
        }

        let mut headers = request.headers.clone();
        for dropped in self.lock().dropped_headers.iter() {
            headers.remove(dropped);
        }

        self.put(container, &request.object_name, &data, headers);

        self.stat_object(container, &request.object_name)
    }
}

#[async_trait]
impl StorageTrait for MemoryStorage {
    async fn stat(&self, container: &str, objects: &[String]) -> Vec<StatResult> {
        objects
            .iter()
            .map(|object| match self.stat_object(container, object) {
                Ok(headers) => StatResult {
                    object: object.clone(),
                    success: true,
                    headers,
                    error: None,
                },
                Err(e) => StatResult {
                    object: object.clone(),
                    success: false,
                    headers: MetadataRecord::new(),
                    error: Some(format!("{e}")),
                },
            })
            .collect()
    }

    async fn download(&self, container: &str, objects: &[String]) -> Vec<FetchResult> {
        let mut results = Vec::with_capacity(objects.len());
        for object in objects {
            let result = match self.download_object(container, object).await {
                Ok((path, headers)) => FetchResult {
                    object: object.clone(),
                    success: true,
                    path: Some(path),
                    headers,
                    error: None,
                },
                Err(e) => FetchResult {
                    object: object.clone(),
                    success: false,
                    path: None,
                    headers: MetadataRecord::new(),
                    error: Some(format!("{e:#}")),
                },
            };
            results.push(result);
        }
        results
    }

    async fn upload(&self, container: &str, requests: Vec<TransferRequest>) -> Vec<UploadResult> {
        let mut results = Vec::new();
        for request in requests {
            self.lock().upload_count += 1;

            let (success, headers, error) =
                match self.upload_object(container, &request, &mut results).await {
                    Ok(headers) => (true, headers, None),
                    Err(e) => (false, MetadataRecord::new(), Some(format!("{e:#}"))),
                };

            debug!(
                container = container,
                key = request.object_name,
                success = success,
                "memory upload completed."
            );

            results.push(UploadResult {
                action: UploadAction::UploadObject,
                success,
                container: container.to_string(),
                object: request.object_name,
                path: request.path,
                headers,
                error,
                segment_index: None,
            });
        }
        results
    }
}

fn http_date_now() -> String {
    DateTime::from(SystemTime::now())
        .fmt(Format::HttpDate)
        .unwrap_or_default()
}
