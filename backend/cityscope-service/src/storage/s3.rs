use super::{object_key, public_url, BlobError, BlobStore, StoredBlob};
use crate::config::StorageConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

/// Stores post images in an S3 bucket
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    key_prefix: String,
    public_base_url: String,
    timeout: Duration,
}

impl S3BlobStore {
    /// Build a client from the default AWS credential chain
    pub async fn from_config(config: &StorageConfig, bucket: String) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;

        Self {
            client: Client::new(&aws_config),
            bucket,
            key_prefix: config.key_prefix.clone(),
            public_base_url: config.public_base_url.clone(),
            timeout: Duration::from_millis(config.upload_timeout_ms),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob, BlobError> {
        let key = object_key(&self.key_prefix, &Uuid::new_v4().to_string(), content_type);
        let checksum = crypto_core::hash::sha256_hex(&bytes);
        let size = bytes.len();

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .metadata("sha256", &checksum)
            .send();

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(_)) => {
                debug!(key = %key, size, "stored image in S3");
                Ok(StoredBlob {
                    url: public_url(&self.public_base_url, &key),
                    id: key,
                })
            }
            Ok(Err(e)) => {
                error!(key = %key, error = %e, "S3 upload failed");
                Err(BlobError::Backend(e.to_string()))
            }
            Err(_) => Err(BlobError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}
