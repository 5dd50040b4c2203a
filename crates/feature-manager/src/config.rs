//! # Feature Manager Configuration
//!
//! Options describing where the feature document lives and how long a fetched
//! copy stays fresh.
//!
//! ## Defaults
//!
//! | Option | Default |
//! |---|---|
//! | `source_type` | [`SourceType::Local`] |
//! | `source_location` | `features.json` |
//! | `ttl_seconds` | `86400` (one day) |
//! | `object_store` | `None` |
//!
//! ## Environment
//!
//! [`FeatureManagerOptions::from_env`] starts from the defaults and applies
//! `FEATURE_MANAGER_SOURCE_TYPE`, `FEATURE_MANAGER_SOURCE_LOCATION`,
//! `FEATURE_MANAGER_TTL_SECONDS` and `FEATURE_MANAGER_S3_BUCKET`.
//!
//! ## Example
//!
//! ```rust
//! use open_feature_feature_manager::{FeatureManagerOptions, SourceType};
//!
//! let options = FeatureManagerOptions::default()
//!     .with_source_type(SourceType::Http)
//!     .with_source_location("https://config.example.com/features.json")
//!     .with_ttl_seconds(300);
//! assert!(options.validate().is_ok());
//! ```

use crate::error::FeatureManagerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use url::Url;

pub const DEFAULT_SOURCE_LOCATION: &str = "features.json";
pub const DEFAULT_TTL_SECONDS: u64 = 86400;

const ENV_SOURCE_TYPE: &str = "FEATURE_MANAGER_SOURCE_TYPE";
const ENV_SOURCE_LOCATION: &str = "FEATURE_MANAGER_SOURCE_LOCATION";
const ENV_TTL_SECONDS: &str = "FEATURE_MANAGER_TTL_SECONDS";
const ENV_S3_BUCKET: &str = "FEATURE_MANAGER_S3_BUCKET";

/// Where the feature document is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceType {
    #[default]
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "s3")]
    ObjectStore,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Local => "local",
            SourceType::Http => "http",
            SourceType::ObjectStore => "s3",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = FeatureManagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(SourceType::Local),
            "http" => Ok(SourceType::Http),
            "s3" => Ok(SourceType::ObjectStore),
            other => Err(FeatureManagerError::Config(format!(
                "Unknown source type: {}",
                other
            ))),
        }
    }
}

/// Bucket and credentials for the object store source.
///
/// Anything left unset is taken from the standard `AWS_*` environment
/// variables when the store is built.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectStoreOptions {
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Custom endpoint for S3 compatible stores (MinIO, LocalStack, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    /// Permit plain-text HTTP endpoints
    pub allow_http: bool,
}

impl ObjectStoreOptions {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_allow_http(mut self, allow_http: bool) -> Self {
        self.allow_http = allow_http;
        self
    }
}

impl fmt::Debug for ObjectStoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreOptions")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

/// Configuration options for the feature manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureManagerOptions {
    /// Kind of source the document is read from
    /// Default: local
    pub source_type: SourceType,
    /// File path, URL or object key, depending on `source_type`
    /// Default: features.json
    #[serde(alias = "sourcePath", alias = "sourceUrl")]
    pub source_location: String,
    /// Seconds a fetched document stays fresh. Zero refreshes on every lookup.
    /// Default: 86400
    #[serde(alias = "ttl")]
    pub ttl_seconds: u64,
    /// Required when `source_type` is [`SourceType::ObjectStore`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_store: Option<ObjectStoreOptions>,
}

impl Default for FeatureManagerOptions {
    fn default() -> Self {
        Self {
            source_type: SourceType::default(),
            source_location: DEFAULT_SOURCE_LOCATION.to_string(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            object_store: None,
        }
    }
}

impl FeatureManagerOptions {
    /// Create a new FeatureManagerOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the `FEATURE_MANAGER_*` environment variables.
    ///
    /// Values that do not parse are ignored.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(value) = std::env::var(ENV_SOURCE_TYPE) {
            match value.parse() {
                Ok(source_type) => options.source_type = source_type,
                Err(e) => warn!("Ignoring {}: {}", ENV_SOURCE_TYPE, e),
            }
        }

        if let Ok(value) = std::env::var(ENV_SOURCE_LOCATION) {
            options.source_location = value;
        }

        if let Ok(value) = std::env::var(ENV_TTL_SECONDS) {
            match value.parse() {
                Ok(ttl) => options.ttl_seconds = ttl,
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_TTL_SECONDS, value, e),
            }
        }

        if let Ok(bucket) = std::env::var(ENV_S3_BUCKET) {
            options.object_store = Some(ObjectStoreOptions::new(bucket));
        }

        options
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_source_location(mut self, source_location: impl Into<String>) -> Self {
        self.source_location = source_location.into();
        self
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn with_object_store(mut self, object_store: ObjectStoreOptions) -> Self {
        self.object_store = Some(object_store);
        self
    }

    /// Check that the source type has a usable location.
    pub fn validate(&self) -> Result<(), FeatureManagerError> {
        if self.source_location.trim().is_empty() {
            return Err(FeatureManagerError::Config(
                "source location must not be empty".to_string(),
            ));
        }

        match self.source_type {
            SourceType::Local => Ok(()),
            SourceType::Http => {
                let url = Url::parse(&self.source_location)?;
                match url.scheme() {
                    "http" | "https" => Ok(()),
                    scheme => Err(FeatureManagerError::Config(format!(
                        "Unsupported URL scheme for http source: {}",
                        scheme
                    ))),
                }
            }
            SourceType::ObjectStore => match &self.object_store {
                Some(store) if !store.bucket.trim().is_empty() => Ok(()),
                Some(_) => Err(FeatureManagerError::Config(
                    "object store bucket must not be empty".to_string(),
                )),
                None => Err(FeatureManagerError::Config(
                    "s3 source requires object store options with a bucket".to_string(),
                )),
            },
        }
    }
}
