/// In-process artifact store backed by `object_store::memory::InMemory`
///
/// Presigned URLs are `memory:///{path}?expires_in={secs}` and only mean
/// something to code holding the same store.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use std::time::Duration;

use super::{object_path, put_options, ArtifactStore, StorageError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStore {
    inner: Arc<InMemory>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads back an uploaded artifact, `None` if nothing is stored at `path`
    pub async fn get(&self, path: &str) -> Option<Bytes> {
        let location = object_path(path).ok()?;
        let result = self.inner.get(&location).await.ok()?;
        result.bytes().await.ok()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        let location = object_path(path)?;

        self.inner
            .put_opts(&location, PutPayload::from(body), put_options(content_type))
            .await
            .map_err(|e| StorageError::Upload {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn presign(&self, path: &str, expires_in: Duration) -> Result<String, StorageError> {
        let location = object_path(path)?;
        Ok(format!(
            "memory:///{}?expires_in={}",
            location,
            expires_in.as_secs()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryArtifactStore::new();
        store
            .put("1/p/j.json", Bytes::from_static(b"[]"), "application/json")
            .await
            .unwrap();

        assert_eq!(store.get("1/p/j.json").await, Some(Bytes::from_static(b"[]")));
        assert_eq!(store.get("1/p/other.json").await, None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemoryArtifactStore::new();
        store.put("a.csv", Bytes::from_static(b"one"), "text/csv").await.unwrap();
        store.put("a.csv", Bytes::from_static(b"two"), "text/csv").await.unwrap();

        assert_eq!(store.get("a.csv").await, Some(Bytes::from_static(b"two")));
    }

    #[tokio::test]
    async fn test_presign_embeds_path() {
        let store = InMemoryArtifactStore::new();
        let url = store.presign("9/x/y.xml", Duration::from_secs(60)).await.unwrap();
        assert_eq!(url, "memory:///9/x/y.xml?expires_in=60");
    }
}
