/// Artifact storage for finished exports
///
/// An [`ArtifactStore`] accepts a rendered export under a path and hands back
/// a time-limited URL from which it can be fetched. Production uses S3
/// ([`S3ArtifactStore`]); tests use [`InMemoryArtifactStore`].
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use std::time::Duration;
/// use waitlistr_worker::storage::{ArtifactStore, InMemoryArtifactStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryArtifactStore::new();
/// store
///     .put("1/abc/job.csv", Bytes::from_static(b"email,date_added\n"), "text/csv")
///     .await?;
/// let url = store.presign("1/abc/job.csv", Duration::from_secs(3600)).await?;
/// println!("{}", url);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

pub mod memory;
pub mod s3;

pub use memory::InMemoryArtifactStore;
pub use s3::{S3ArtifactStore, S3Settings};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Failed to upload '{path}': {message}")]
    Upload { path: String, message: String },

    #[error("Failed to sign URL for '{path}': {message}")]
    Sign { path: String, message: String },

    #[error("Storage configuration error: {0}")]
    Config(String),
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes `body` at `path`, replacing any existing object
    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Returns a URL that grants read access to `path` for `expires_in`
    async fn presign(&self, path: &str, expires_in: Duration) -> Result<String, StorageError>;
}

pub(crate) fn object_path(path: &str) -> Result<object_store::path::Path, StorageError> {
    object_store::path::Path::parse(path).map_err(|e| StorageError::InvalidPath {
        path: path.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn put_options(content_type: &str) -> object_store::PutOptions {
    let mut attributes = object_store::Attributes::new();
    attributes.insert(
        object_store::Attribute::ContentType,
        content_type.to_string().into(),
    );

    object_store::PutOptions {
        attributes,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_accepts_export_layout() {
        let path = object_path("42/5f1c2b/0123abcd.csv").unwrap();
        assert_eq!(path.as_ref(), "42/5f1c2b/0123abcd.csv");
    }

    #[test]
    fn test_object_path_rejects_traversal() {
        assert!(matches!(
            object_path("42/../etc/passwd"),
            Err(StorageError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_put_options_carry_content_type() {
        let options = put_options("text/csv");
        assert_eq!(
            options
                .attributes
                .get(&object_store::Attribute::ContentType)
                .map(|v| v.as_ref()),
            Some("text/csv")
        );
    }
}
