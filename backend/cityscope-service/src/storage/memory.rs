use super::{object_key, public_url, BlobError, BlobStore, StoredBlob};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Keeps uploaded images in process memory
///
/// Used by tests and by development runs without an `S3_BUCKET`. With
/// `failing()` every store call errors, for exercising upload failure paths.
pub struct MemoryBlobStore {
    base_url: String,
    key_prefix: String,
    fail: bool,
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            key_prefix: key_prefix.into(),
            fail: false,
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("http://blobs.invalid", "")
        }
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content type and bytes stored under `id`
    pub fn get(&self, id: &str) -> Option<(String, Vec<u8>)> {
        self.objects.lock().ok()?.get(id).cloned()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob, BlobError> {
        if self.fail {
            return Err(BlobError::Backend("blob store unavailable".to_string()));
        }

        let key = object_key(&self.key_prefix, &Uuid::new_v4().to_string(), content_type);
        let url = public_url(&self.base_url, &key);
        self.objects
            .lock()
            .map_err(|_| BlobError::Backend("blob map lock poisoned".to_string()))?
            .insert(key.clone(), (content_type.to_string(), bytes));

        Ok(StoredBlob { url, id: key })
    }
}
