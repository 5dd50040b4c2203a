use super::{SourceReader, decode_body};
use crate::error::{FeatureManagerError, SourceFailure};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};
use url::Url;

/// Fetches the feature document with an HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpReader {
    url: Url,
    client: Client,
}

impl HttpReader {
    pub fn new(url: &str) -> Result<Self, FeatureManagerError> {
        let client = Client::builder().build().map_err(|e| {
            FeatureManagerError::Config(format!("Failed to build HTTP client: {}", e))
        })?;
        Self::with_client(url, client)
    }

    /// Use a preconfigured client, e.g. one carrying default headers.
    pub fn with_client(url: &str, client: Client) -> Result<Self, FeatureManagerError> {
        Ok(Self {
            url: Url::parse(url)?,
            client,
        })
    }
}

#[async_trait]
impl SourceReader for HttpReader {
    async fn fetch(&self) -> Result<String, FeatureManagerError> {
        debug!(url = %self.url, "Fetching feature document");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch feature document");
                FeatureManagerError::source_unavailable(SourceFailure::Network, e.to_string())
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received response");

        if !status.is_success() {
            error!(status = status.as_u16(), "Feature document request rejected");
            return Err(FeatureManagerError::source_unavailable(
                SourceFailure::Status(status.as_u16()),
                format!("GET {} returned {}", self.url, status),
            ));
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, "Failed to read feature document body");
            FeatureManagerError::source_unavailable(SourceFailure::Network, e.to_string())
        })?;
        decode_body(body.to_vec())
    }
}
