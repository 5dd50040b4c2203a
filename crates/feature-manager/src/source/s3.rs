use super::{SourceReader, decode_body};
use crate::config::ObjectStoreOptions;
use crate::error::{FeatureManagerError, SourceFailure};
use async_trait::async_trait;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Fetches the feature document from a bucket.
pub struct ObjectStoreReader {
    store: Arc<dyn ObjectStore>,
    key: Path,
}

impl fmt::Debug for ObjectStoreReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreReader")
            .field("store", &self.store.to_string())
            .field("key", &self.key)
            .finish()
    }
}

impl ObjectStoreReader {
    /// Read `key` from an already built store.
    pub fn new(store: Arc<dyn ObjectStore>, key: &str) -> Result<Self, FeatureManagerError> {
        let key = Path::parse(key).map_err(|e| {
            FeatureManagerError::Config(format!("Invalid object key {:?}: {}", key, e))
        })?;
        Ok(Self { store, key })
    }

    /// Build an S3 store from the `AWS_*` environment, overlaid with `options`.
    pub fn from_options(
        options: &ObjectStoreOptions,
        key: &str,
    ) -> Result<Self, FeatureManagerError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&options.bucket)
            .with_allow_http(options.allow_http);
        if let Some(region) = &options.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &options.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(access_key_id) = &options.access_key_id {
            builder = builder.with_access_key_id(access_key_id);
        }
        if let Some(secret_access_key) = &options.secret_access_key {
            builder = builder.with_secret_access_key(secret_access_key);
        }
        if let Some(session_token) = &options.session_token {
            builder = builder.with_token(session_token);
        }

        let store = builder.build().map_err(|e| {
            FeatureManagerError::Config(format!("Failed to build S3 client: {}", e))
        })?;
        Self::new(Arc::new(store), key)
    }
}

fn failure_cause(error: &object_store::Error) -> SourceFailure {
    match error {
        object_store::Error::NotFound { .. } => SourceFailure::NotFound,
        object_store::Error::PermissionDenied { .. }
        | object_store::Error::Unauthenticated { .. } => SourceFailure::Auth,
        _ => SourceFailure::Io,
    }
}

#[async_trait]
impl SourceReader for ObjectStoreReader {
    async fn fetch(&self) -> Result<String, FeatureManagerError> {
        debug!(key = %self.key, "Fetching feature document from object store");

        let unavailable = |e: object_store::Error| {
            error!(key = %self.key, error = %e, "Failed to fetch feature document");
            FeatureManagerError::source_unavailable(failure_cause(&e), e.to_string())
        };

        let bytes = self
            .store
            .get(&self.key)
            .await
            .map_err(unavailable)?
            .bytes()
            .await
            .map_err(unavailable)?;

        decode_body(bytes.to_vec())
    }
}
