use anyhow::{Result, anyhow};

use crate::Config;
use crate::storage::s3::S3StorageFactory;
use crate::storage::{StorageFactory, StoragePair};

pub async fn create_storage_pair(config: &Config) -> Result<StoragePair> {
    let source_client_config = config
        .source_client_config
        .as_ref()
        .ok_or_else(|| anyhow!("source client config is not set."))?;
    let target_client_config = config
        .target_client_config
        .as_ref()
        .ok_or_else(|| anyhow!("target client config is not set."))?;

    let source = S3StorageFactory::create(
        source_client_config,
        &config.tmp_dir,
        config.transfer_config,
    )
    .await;
    let target = S3StorageFactory::create(
        target_client_config,
        &config.tmp_dir,
        config.transfer_config,
    )
    .await;

    Ok(StoragePair { source, target })
}
