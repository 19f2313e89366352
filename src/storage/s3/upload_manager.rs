use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tracing::{debug, trace, warn};

use crate::config::TransferConfig;
use crate::types::metadata::MetadataRecord;
use crate::types::{TransferRequest, UploadAction, UploadResult};

pub struct UploadManager {
    client: Arc<Client>,
    transfer_config: TransferConfig,
}

impl UploadManager {
    pub fn new(client: Arc<Client>, transfer_config: TransferConfig) -> Self {
        UploadManager {
            client,
            transfer_config,
        }
    }

    /// Uploads one request. Segment outcomes are pushed to `segment_results`
    /// as they happen.
    pub async fn upload(
        &self,
        bucket: &str,
        request: &TransferRequest,
        segment_results: &mut Vec<UploadResult>,
    ) -> Result<()> {
        let content_length = tokio::fs::metadata(&request.path)
            .await
            .context("tokio::fs::metadata() failed.")?
            .len();

        if self
            .transfer_config
            .is_segmented_upload_required(content_length)
        {
            self.multipart_upload(bucket, request, content_length, segment_results)
                .await
        } else {
            self.singlepart_upload(bucket, request).await
        }
    }

    async fn singlepart_upload(&self, bucket: &str, request: &TransferRequest) -> Result<()> {
        let body = ByteStream::from_path(&request.path)
            .await
            .context("ByteStream::from_path() failed.")?;

        let put_object_output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(&request.object_name)
            .set_content_type(content_type(&request.headers))
            .set_metadata(user_metadata(&request.headers))
            .body(body)
            .send()
            .await
            .context("aws_sdk_s3::client::Client put_object() failed.")?;

        trace!(key = request.object_name, "{put_object_output:?}");

        Ok(())
    }

    async fn multipart_upload(
        &self,
        bucket: &str,
        request: &TransferRequest,
        content_length: u64,
        segment_results: &mut Vec<UploadResult>,
    ) -> Result<()> {
        let create_multipart_upload_output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(&request.object_name)
            .set_content_type(content_type(&request.headers))
            .set_metadata(user_metadata(&request.headers))
            .send()
            .await
            .context("aws_sdk_s3::client::Client create_multipart_upload() failed.")?;
        let upload_id = create_multipart_upload_output
            .upload_id()
            .ok_or_else(|| anyhow!("create_multipart_upload() returned no upload id."))?;

        let upload_result = self
            .upload_parts_and_complete(bucket, request, upload_id, content_length, segment_results)
            .await
            .context("upload_parts_and_complete() failed.");
        if let Err(e) = upload_result {
            warn!(
                key = request.object_name,
                upload_id = upload_id,
                "multipart upload failed. aborting."
            );

            let abort_result = self
                .client
                .abort_multipart_upload()
                .bucket(bucket)
                .key(&request.object_name)
                .upload_id(upload_id)
                .send()
                .await
                .context("aws_sdk_s3::client::Client abort_multipart_upload() failed.")
                .map(|_| ());

            return Err(keep_upload_error(
                e,
                abort_result,
                &request.object_name,
                upload_id,
            ));
        }

        Ok(())
    }

    async fn upload_parts_and_complete(
        &self,
        bucket: &str,
        request: &TransferRequest,
        upload_id: &str,
        content_length: u64,
        segment_results: &mut Vec<UploadResult>,
    ) -> Result<()> {
        let upload_parts = self
            .upload_parts(bucket, request, upload_id, content_length, segment_results)
            .await?;

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(upload_parts))
            .build();

        let complete_multipart_upload_output = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(&request.object_name)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await
            .context("aws_sdk_s3::client::Client complete_multipart_upload() failed.")?;

        trace!(
            key = request.object_name,
            upload_id = upload_id,
            "{complete_multipart_upload_output:?}"
        );

        Ok(())
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        request: &TransferRequest,
        upload_id: &str,
        content_length: u64,
        segment_results: &mut Vec<UploadResult>,
    ) -> Result<Vec<CompletedPart>> {
        let segment_size = self.transfer_config.segment_size;
        let mut upload_parts: Vec<CompletedPart> = Vec::new();

        let mut part_number = 1;
        let mut offset = 0;
        while offset < content_length {
            let chunksize = (content_length - offset).min(segment_size);
            let segment_index = (part_number - 1) as u32;

            let result = self
                .upload_part(bucket, request, upload_id, part_number, offset, chunksize)
                .await;

            segment_results.push(UploadResult {
                action: UploadAction::UploadSegment,
                success: result.is_ok(),
                container: bucket.to_string(),
                object: request.object_name.clone(),
                path: request.path.clone(),
                headers: MetadataRecord::new(),
                error: result.as_ref().err().map(|e| format!("{e:#}")),
                segment_index: Some(segment_index),
            });

            let completed_part = result.with_context(|| {
                format!("segment upload failed. segment_index={segment_index}")
            })?;

            debug!(
                key = request.object_name,
                segment_index = segment_index,
                size = chunksize,
                "segment uploaded."
            );

            upload_parts.push(completed_part);

            offset += chunksize;
            part_number += 1;
        }
        trace!(
            key = request.object_name,
            upload_id = upload_id,
            "{upload_parts:?}"
        );

        Ok(upload_parts)
    }

    async fn upload_part(
        &self,
        bucket: &str,
        request: &TransferRequest,
        upload_id: &str,
        part_number: i32,
        offset: u64,
        chunksize: u64,
    ) -> Result<CompletedPart> {
        let body = read_segment(&request.path, offset, chunksize).await?;

        let upload_part_output = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(&request.object_name)
            .upload_id(upload_id)
            .part_number(part_number)
            .content_length(chunksize as i64)
            .body(body)
            .send()
            .await
            .context("aws_sdk_s3::client::Client upload_part() failed.")?;

        trace!(key = request.object_name, "{upload_part_output:?}");

        Ok(CompletedPart::builder()
            .set_e_tag(upload_part_output.e_tag().map(|e_tag| e_tag.to_string()))
            .part_number(part_number)
            .build())
    }
}

/// An abort failure is only logged; the upload error stays the root cause.
fn keep_upload_error(
    upload_error: anyhow::Error,
    abort_result: Result<()>,
    key: &str,
    upload_id: &str,
) -> anyhow::Error {
    if let Err(e) = abort_result {
        warn!(
            key = key,
            upload_id = upload_id,
            error = format!("{e:#}"),
            "abort_multipart_upload failed. the incomplete upload is left behind."
        );
    }

    upload_error
}

async fn read_segment(path: &Path, offset: u64, chunksize: u64) -> Result<ByteStream> {
    ByteStream::read_from()
        .path(path)
        .offset(offset)
        .length(Length::Exact(chunksize))
        .build()
        .await
        .context("ByteStream::read_from() failed.")
}

fn content_type(headers: &MetadataRecord) -> Option<String> {
    headers.content_type().map(|value| value.to_string())
}

fn user_metadata(headers: &MetadataRecord) -> Option<HashMap<String, String>> {
    let metadata: HashMap<String, String> = headers.user_metadata().into_iter().collect();
    if metadata.is_empty() {
        None
    } else {
        Some(metadata)
    }
}
