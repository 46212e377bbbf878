// dbbackup/src/backup/s3_upload.rs
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::primitives::ByteStream;
use tracing::info;

use crate::config::Settings;
use crate::errors::{BackupError, Result};

/// Upload sink for an S3-compatible object storage service. Built once at
/// startup and shared by every backup pass.
pub struct S3Sink {
    client: s3::Client,
    bucket: String,
}

impl S3Sink {
    pub async fn new(settings: &Settings) -> Self {
        let sdk_config = aws_config::defaults(s3::config::BehaviorVersion::latest())
            .region(Region::new(settings.s3_region.clone()))
            .credentials_provider(s3::config::Credentials::new(
                &settings.aws_access_key_id,
                &settings.aws_secret_access_key,
                None,
                None,
                "Static",
            ))
            .load()
            .await;

        S3Sink {
            client: s3::Client::new(&sdk_config),
            bucket: settings.s3_bucket.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(client: s3::Client, bucket: String) -> Self {
        S3Sink { client, bucket }
    }

    /// One `PutObject` of the whole buffer under `key`. Not retried; the
    /// per-target error boundary decides what a failure means.
    pub async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<u64> {
        let size = bytes.len() as u64;
        info!(
            "Uploading {} bytes to s3://{}/{}",
            size, self.bucket, key
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                BackupError::Upload(format!(
                    "put_object of key {} to bucket {}: {}",
                    key, self.bucket, e
                ))
            })?;

        Ok(size)
    }
}
