//! Image blob storage.
//!
//! Post images go through [`BlobStore`]; the service never talks to S3
//! directly, so tests swap in [`MemoryBlobStore`].

pub mod memory;
pub mod s3;

pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

/// Durable location of a stored image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub url: String,
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("upload timed out after {0} ms")]
    Timeout(u64),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<BlobError> for crate::error::AppError {
    fn from(err: BlobError) -> Self {
        crate::error::AppError::Upload(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob, BlobError>;
}

/// File extension used in object keys for an image content type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/heic" => "heic",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Object key `<prefix>/<id>.<ext>`
pub fn object_key(prefix: &str, id: &str, content_type: &str) -> String {
    let file = format!("{}.{}", id, extension_for(content_type));
    if prefix.is_empty() {
        file
    } else {
        format!("{}/{}", prefix, file)
    }
}

/// Public link `<base_url>/<key>` with exactly one separating slash
pub fn public_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}
