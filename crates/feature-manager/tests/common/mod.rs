#![allow(dead_code)]

use async_trait::async_trait;
use open_feature_feature_manager::FeatureManagerError;
use open_feature_feature_manager::source::SourceReader;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ROUND_TRIP_DOCUMENT: &str =
    r#"{"a": true, "b": {"enabled": false}, "c": {"option1": "x"}}"#;

pub fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("samples")
        .join(name)
}

/// Serves a swappable response and counts fetches.
pub struct CountingReader {
    response: Mutex<Result<String, FeatureManagerError>>,
    calls: AtomicUsize,
}

impl CountingReader {
    pub fn new(body: &str) -> Self {
        Self {
            response: Mutex::new(Ok(body.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn respond_with(&self, response: Result<String, FeatureManagerError>) {
        *self.response.lock().unwrap() = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceReader for CountingReader {
    async fn fetch(&self) -> Result<String, FeatureManagerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.lock().unwrap().clone()
    }
}
