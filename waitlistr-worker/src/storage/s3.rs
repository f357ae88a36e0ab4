/// S3-compatible artifact store
///
/// Uploads through `object_store`'s `AmazonS3` client and presigns GET URLs
/// with its `Signer` implementation. `endpoint` points the client at a
/// non-AWS service (MinIO, R2, localstack).

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use std::time::Duration;

use super::{object_path, put_options, ArtifactStore, StorageError};

/// Connection settings for [`S3ArtifactStore`]
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Clone)]
pub struct S3ArtifactStore {
    client: Arc<AmazonS3>,
    bucket: String,
}

impl S3ArtifactStore {
    /// Builds the S3 client
    ///
    /// Credentials fall back to the standard AWS environment when not given.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the builder rejects the settings
    pub fn new(settings: &S3Settings) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&settings.bucket)
            .with_region(&settings.region);

        if let Some(key) = &settings.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &settings.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(endpoint) = &settings.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let client = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        tracing::info!(
            bucket = %settings.bucket,
            region = %settings.region,
            custom_endpoint = settings.endpoint.is_some(),
            "S3 artifact store configured"
        );

        Ok(Self {
            client: Arc::new(client),
            bucket: settings.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        let location = object_path(path)?;
        let size = body.len();

        self.client
            .put_opts(&location, PutPayload::from(body), put_options(content_type))
            .await
            .map_err(|e| StorageError::Upload {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(bucket = %self.bucket, path = %path, size, "Artifact uploaded");
        Ok(())
    }

    async fn presign(&self, path: &str, expires_in: Duration) -> Result<String, StorageError> {
        let location = object_path(path)?;

        let url = self
            .client
            .signed_url(http::Method::GET, &location, expires_in)
            .await
            .map_err(|e| StorageError::Sign {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> S3Settings {
        S3Settings {
            bucket: "waitlistr-exports".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string()),
            endpoint: Some("http://localhost:9000".to_string()),
        }
    }

    #[tokio::test]
    async fn test_presign_is_offline_and_scoped_to_path() {
        let store = S3ArtifactStore::new(&settings()).unwrap();
        assert_eq!(store.bucket(), "waitlistr-exports");

        let url = store
            .presign("7/abc/job1.csv", Duration::from_secs(3600))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/"));
        assert!(url.contains("7/abc/job1.csv"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    #[ignore] // Requires running S3-compatible service
    async fn test_put_against_live_bucket() {
        let store = S3ArtifactStore::new(&settings()).unwrap();
        store
            .put("test/put.csv", Bytes::from_static(b"email,date_added\n"), "text/csv")
            .await
            .unwrap();
    }
}
