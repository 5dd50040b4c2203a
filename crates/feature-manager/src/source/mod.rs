//! # Source Readers
//!
//! A [`SourceReader`] produces the raw feature document text for one
//! configured location. The reader for a manager is chosen once, by
//! [`reader_for`], from the configured [`SourceType`]:
//!
//! * [`SourceType::Local`] - [`LocalFileReader`]
//! * [`SourceType::Http`] - `HttpReader` (cargo feature `http`)
//! * [`SourceType::ObjectStore`] - `ObjectStoreReader` (cargo feature `s3`)
//!
//! When a build leaves out the feature for the configured source type, an
//! [`UnsupportedReader`] is bound instead and every fetch fails with
//! [`FeatureManagerError::UnsupportedSource`].
//!
//! Readers never retry.

#[cfg(feature = "http")]
pub mod http;
pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

#[cfg(feature = "http")]
pub use http::HttpReader;
pub use local::LocalFileReader;
#[cfg(feature = "s3")]
pub use s3::ObjectStoreReader;

use crate::config::{FeatureManagerOptions, SourceType};
use crate::error::FeatureManagerError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Read the raw feature document.
    async fn fetch(&self) -> Result<String, FeatureManagerError>;
}

/// Reader bound when the configured source type is not compiled in.
#[derive(Debug, Clone, Copy)]
pub struct UnsupportedReader {
    source_type: SourceType,
}

impl UnsupportedReader {
    pub fn new(source_type: SourceType) -> Self {
        Self { source_type }
    }
}

#[async_trait]
impl SourceReader for UnsupportedReader {
    async fn fetch(&self) -> Result<String, FeatureManagerError> {
        Err(FeatureManagerError::UnsupportedSource(self.source_type))
    }
}

/// Decode a fetched body. Bytes that are not valid UTF-8 make the document
/// malformed; they are never replaced.
pub(crate) fn decode_body(bytes: Vec<u8>) -> Result<String, FeatureManagerError> {
    String::from_utf8(bytes).map_err(|e| {
        FeatureManagerError::MalformedDocument(format!(
            "feature document is not valid UTF-8: {}",
            e
        ))
    })
}

/// Bind the reader for the configured source type.
pub fn reader_for(
    options: &FeatureManagerOptions,
) -> Result<Arc<dyn SourceReader>, FeatureManagerError> {
    let reader: Arc<dyn SourceReader> = match options.source_type {
        SourceType::Local => Arc::new(LocalFileReader::new(&options.source_location)),
        SourceType::Http => http_reader(options)?,
        SourceType::ObjectStore => object_store_reader(options)?,
    };
    Ok(reader)
}

#[cfg(feature = "http")]
fn http_reader(
    options: &FeatureManagerOptions,
) -> Result<Arc<dyn SourceReader>, FeatureManagerError> {
    Ok(Arc::new(HttpReader::new(&options.source_location)?))
}

#[cfg(not(feature = "http"))]
fn http_reader(
    options: &FeatureManagerOptions,
) -> Result<Arc<dyn SourceReader>, FeatureManagerError> {
    tracing::warn!("http source requested but the `http` feature is disabled");
    Ok(Arc::new(UnsupportedReader::new(options.source_type)))
}

#[cfg(feature = "s3")]
fn object_store_reader(
    options: &FeatureManagerOptions,
) -> Result<Arc<dyn SourceReader>, FeatureManagerError> {
    let store_options = options.object_store.as_ref().ok_or_else(|| {
        FeatureManagerError::Config(
            "s3 source requires object store options with a bucket".to_string(),
        )
    })?;
    Ok(Arc::new(ObjectStoreReader::from_options(
        store_options,
        &options.source_location,
    )?))
}

#[cfg(not(feature = "s3"))]
fn object_store_reader(
    options: &FeatureManagerOptions,
) -> Result<Arc<dyn SourceReader>, FeatureManagerError> {
    tracing::warn!("s3 source requested but the `s3` feature is disabled");
    Ok(Arc::new(UnsupportedReader::new(options.source_type)))
}
