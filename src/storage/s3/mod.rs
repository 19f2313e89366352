use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::DateTime;
use aws_smithy_types::date_time::Format;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, trace};

use crate::config::{ClientConfig, TransferConfig};
use crate::storage::s3::upload_manager::UploadManager;
use crate::storage::{
    Storage, StorageFactory, StorageTrait, create_parent_directory, staging_path,
};
use crate::types::metadata::{
    CONTENT_LENGTH_HEADER, CONTENT_TYPE_HEADER, ETAG_HEADER, LAST_MODIFIED_HEADER,
    MetadataRecord, USER_METADATA_PREFIX,
};
use crate::types::{FetchResult, StatResult, TransferRequest, UploadAction, UploadResult};

mod client_builder;
mod upload_manager;

pub struct S3StorageFactory {}

#[async_trait]
impl StorageFactory for S3StorageFactory {
    async fn create(
        client_config: &ClientConfig,
        staging_dir: &Path,
        transfer_config: TransferConfig,
    ) -> Storage {
        S3Storage::boxed_new(
            Arc::new(client_config.create_client().await),
            staging_dir,
            transfer_config,
        )
    }
}

struct S3Storage {
    client: Arc<Client>,
    staging_dir: PathBuf,
    transfer_config: TransferConfig,
}

impl S3Storage {
    fn boxed_new(client: Arc<Client>, staging_dir: &Path, transfer_config: TransferConfig) -> Storage {
        Box::new(S3Storage {
            client,
            staging_dir: staging_dir.to_path_buf(),
            transfer_config,
        })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<MetadataRecord> {
        let head_object_output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context("aws_sdk_s3::client::head_object() failed.")?;

        trace!(key = key, "{head_object_output:?}");

        Ok(build_metadata_record(
            head_object_output.content_type(),
            head_object_output.e_tag(),
            head_object_output.last_modified(),
            head_object_output.content_length(),
            head_object_output.metadata(),
        ))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<(PathBuf, MetadataRecord)> {
        let path = staging_path(&self.staging_dir, key)?;

        let get_object_output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context("aws_sdk_s3::client::get_object() failed.")?;

        let headers = build_metadata_record(
            get_object_output.content_type(),
            get_object_output.e_tag(),
            get_object_output.last_modified(),
            get_object_output.content_length(),
            get_object_output.metadata(),
        );

        create_parent_directory(&path).await?;
        let mut file = tokio::fs::File::create(&path)
            .await
            .context("tokio::fs::File::create() failed.")?;

        let mut body = get_object_output.body.into_async_read();
        let size = tokio::io::copy(&mut body, &mut file)
            .await
            .context("tokio::io::copy() failed.")?;
        file.flush().await?;

        debug!(
            key = key,
            path = path.display().to_string(),
            size = size,
            "object downloaded."
        );

        Ok((path, headers))
    }

    async fn put_object(
        &self,
        bucket: &str,
        request: &TransferRequest,
        segment_results: &mut Vec<UploadResult>,
    ) -> Result<MetadataRecord> {
        UploadManager::new(self.client.clone(), self.transfer_config)
            .upload(bucket, request, segment_results)
            .await?;

        let headers = self
            .head_object(bucket, &request.object_name)
            .await
            .context("stat after upload failed.")?;

        info!(
            container = bucket,
            key = request.object_name,
            size = headers.get(CONTENT_LENGTH_HEADER).unwrap_or_default(),
            "upload completed."
        );

        Ok(headers)
    }
}

#[async_trait]
impl StorageTrait for S3Storage {
    async fn stat(&self, container: &str, objects: &[String]) -> Vec<StatResult> {
        let mut results = Vec::with_capacity(objects.len());
        for object in objects {
            let result = match self.head_object(container, object).await {
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
                    error: Some(format!("{e:#}")),
                },
            };
            results.push(result);
        }
        results
    }

    async fn download(&self, container: &str, objects: &[String]) -> Vec<FetchResult> {
        let mut results = Vec::with_capacity(objects.len());
        for object in objects {
            let result = match self.get_object(container, object).await {
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
            let (success, headers, error) =
                match self.put_object(container, &request, &mut results).await {
                    Ok(headers) => (true, headers, None),
                    Err(e) => (false, MetadataRecord::new(), Some(format!("{e:#}"))),
                };

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

/// Flattens an S3 response into a header record. User metadata is exposed
/// under the `x-object-meta-` prefix.
fn build_metadata_record(
    content_type: Option<&str>,
    e_tag: Option<&str>,
    last_modified: Option<&DateTime>,
    content_length: Option<i64>,
    metadata: Option<&HashMap<String, String>>,
) -> MetadataRecord {
    let mut record = MetadataRecord::new();

    if let Some(content_type) = content_type {
        record.insert(CONTENT_TYPE_HEADER, content_type);
    }
    if let Some(e_tag) = e_tag {
        record.insert(ETAG_HEADER, e_tag);
    }
    if let Some(last_modified) = last_modified.and_then(|time| time.fmt(Format::HttpDate).ok()) {
        record.insert(LAST_MODIFIED_HEADER, last_modified);
    }
    if let Some(content_length) = content_length {
        record.insert(CONTENT_LENGTH_HEADER, content_length.to_string());
    }
    for (key, value) in metadata.into_iter().flatten() {
        record.insert(format!("{USER_METADATA_PREFIX}{key}"), value.as_str());
    }

    record
}
