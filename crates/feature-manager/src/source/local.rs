use super::{SourceReader, decode_body};
use crate::error::{FeatureManagerError, SourceFailure};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, error};

/// Reads the feature document from the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileReader {
    path: PathBuf,
}

impl LocalFileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SourceReader for LocalFileReader {
    async fn fetch(&self) -> Result<String, FeatureManagerError> {
        debug!("Reading feature document from file: {:?}", self.path);
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            error!("Failed to read feature file {:?}: {}", self.path, e);
            FeatureManagerError::source_unavailable(
                failure_cause(e.kind()),
                format!("{}: {}", self.path.display(), e),
            )
        })?;
        decode_body(bytes)
    }
}

fn failure_cause(kind: ErrorKind) -> SourceFailure {
    match kind {
        ErrorKind::NotFound => SourceFailure::NotFound,
        ErrorKind::PermissionDenied => SourceFailure::PermissionDenied,
        _ => SourceFailure::Io,
    }
}
