//! Feature Manager for OpenFeature
//!
//! A small in-process cache for a feature flag document. The document is a flat
//! JSON object mapping feature ids to either a boolean or an options record:
//!
//! ```json
//! {
//!     "some.feature": true,
//!     "feature.with.options": { "enabled": true, "option1": "Yes!" },
//!     "feature.explicitly.disabled": { "disabled": true }
//! }
//! ```
//!
//! The document is read from a local file, an HTTP endpoint or an S3 bucket,
//! cached for a configurable time-to-live and refreshed lazily on the first
//! lookup after it expires. Concurrent lookups during a refresh share a single
//! fetch, and a failed refresh keeps serving the previous document.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use open_feature_feature_manager::{FeatureManager, FeatureManagerOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = FeatureManager::new(
//!         FeatureManagerOptions::default().with_source_location("/etc/app/features.json"),
//!     )
//!     .unwrap();
//!
//!     if manager.is_enabled("some.feature").await.unwrap() {
//!         println!("some.feature is on");
//!     }
//!
//!     // Answers from memory only, once a lookup above has loaded the document
//!     let enabled = manager.is_enabled_sync("feature.with.options").unwrap();
//!     println!("feature.with.options: {}", enabled);
//! }
//! ```
//!
//! # Resolution
//!
//! A missing feature is disabled. A boolean is taken as is. A record is enabled
//! unless it carries `"disabled": true` or `"enabled": false`.

pub mod config;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod provider;
pub mod refresh;
pub mod source;

use chrono::{DateTime, Utc};
use refresh::RefreshCoordinator;
use serde_json::Value;
use source::SourceReader;
use std::sync::Arc;
use tracing::{debug, instrument};

pub use config::{FeatureManagerOptions, ObjectStoreOptions, SourceType};
pub use document::{FeatureDocument, FeatureOptions, FlagState};
pub use error::{FeatureManagerError, SourceFailure};
pub use provider::FeatureManagerProvider;

/// Caches one feature document and answers lookups against it.
#[derive(Debug)]
pub struct FeatureManager {
    options: FeatureManagerOptions,
    coordinator: RefreshCoordinator,
}

impl FeatureManager {
    /// Creates a manager reading from the source described by `options`.
    ///
    /// # Errors
    ///
    /// Returns `FeatureManagerError::Config` if the source type has no valid
    /// location, or the source client cannot be built.
    #[instrument(skip(options))]
    pub fn new(options: FeatureManagerOptions) -> Result<Self, FeatureManagerError> {
        options.validate()?;
        let reader = source::reader_for(&options)?;
        Ok(Self::with_reader(options, reader))
    }

    /// Creates a manager that fetches through a caller supplied reader.
    ///
    /// Only `ttl_seconds` is taken from `options`; the location fields are
    /// kept for [`FeatureManager::config`].
    pub fn with_reader(options: FeatureManagerOptions, reader: Arc<dyn SourceReader>) -> Self {
        debug!("Initializing FeatureManager with options: {:?}", options);
        Self {
            coordinator: RefreshCoordinator::new(reader, options.ttl_seconds),
            options,
        }
    }

    pub fn config(&self) -> &FeatureManagerOptions {
        &self.options
    }

    /// The cached document, refreshed first if it expired or `force_refresh` is set.
    pub async fn feature_document(
        &self,
        force_refresh: bool,
    ) -> Result<Arc<FeatureDocument>, FeatureManagerError> {
        self.coordinator.ensure_fresh(force_refresh).await
    }

    #[instrument(skip(self))]
    pub async fn is_enabled(&self, feature_id: &str) -> Result<bool, FeatureManagerError> {
        let document = self.coordinator.ensure_fresh(false).await?;
        Ok(evaluator::is_enabled(&document, feature_id))
    }

    /// The flag state of `feature_id`, or `None` when the document does not list it.
    #[instrument(skip(self))]
    pub async fn options(&self, feature_id: &str) -> Result<Option<FlagState>, FeatureManagerError> {
        let document = self.coordinator.ensure_fresh(false).await?;
        Ok(evaluator::options(&document, feature_id).cloned())
    }

    /// One option field of `feature_id`'s record.
    #[instrument(skip(self))]
    pub async fn option(
        &self,
        feature_id: &str,
        key: &str,
    ) -> Result<Option<Value>, FeatureManagerError> {
        let document = self.coordinator.ensure_fresh(false).await?;
        Ok(evaluator::option_value(&document, feature_id, key).cloned())
    }

    /// Answers from memory without any I/O.
    ///
    /// # Errors
    ///
    /// Returns `FeatureManagerError::NotInitialized` if no document has been
    /// loaded yet or the loaded one has expired. Use
    /// [`FeatureManager::is_enabled`] to refresh.
    pub fn is_enabled_sync(&self, feature_id: &str) -> Result<bool, FeatureManagerError> {
        let document = self.coordinator.snapshot()?;
        Ok(evaluator::is_enabled(&document, feature_id))
    }

    /// When the cached document goes stale. The Unix epoch until the first
    /// successful refresh.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.coordinator.expires_at()
    }
}
