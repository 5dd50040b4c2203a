use crate::config::SourceType;
use std::fmt;
use thiserror::Error;

/// Why a source could not produce the flag document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFailure {
    /// The file or object does not exist
    NotFound,
    /// The process may not read the file
    PermissionDenied,
    /// The object store rejected the credentials
    Auth,
    /// The request never produced a response
    Network,
    /// The server answered with a non-2xx status
    Status(u16),
    /// Any other I/O failure
    Io,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFailure::NotFound => write!(f, "not found"),
            SourceFailure::PermissionDenied => write!(f, "permission denied"),
            SourceFailure::Auth => write!(f, "authentication failed"),
            SourceFailure::Network => write!(f, "network error"),
            SourceFailure::Status(code) => write!(f, "unexpected status {}", code),
            SourceFailure::Io => write!(f, "i/o error"),
        }
    }
}

/// Errors surfaced by the feature manager.
///
/// The type is `Clone` so that every caller joined on the same refresh
/// receives the same failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureManagerError {
    /// The underlying fetch failed. The cached document is left as it was.
    #[error("Source unavailable ({cause}): {message}")]
    SourceUnavailable {
        cause: SourceFailure,
        message: String,
    },

    /// The fetched content is not a valid feature document.
    #[error("Malformed feature document: {0}")]
    MalformedDocument(String),

    /// A synchronous lookup found no fresh document in memory.
    #[error("Unable to synchronously check for feature; the feature document has not been initialized or has expired")]
    NotInitialized,

    /// The configured source type is not compiled into this build.
    #[error("Unsupported source type: {0}")]
    UnsupportedSource(SourceType),

    /// The options do not describe a usable source.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl FeatureManagerError {
    pub(crate) fn source_unavailable(cause: SourceFailure, message: impl Into<String>) -> Self {
        FeatureManagerError::SourceUnavailable {
            cause,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for FeatureManagerError {
    fn from(error: serde_json::Error) -> Self {
        FeatureManagerError::MalformedDocument(error.to_string())
    }
}

impl From<url::ParseError> for FeatureManagerError {
    fn from(error: url::ParseError) -> Self {
        FeatureManagerError::Config(format!("Invalid URL: {}", error))
    }
}

/// Map FeatureManagerError to OpenFeature EvaluationError
impl From<FeatureManagerError> for open_feature::EvaluationError {
    fn from(error: FeatureManagerError) -> Self {
        use open_feature::EvaluationErrorCode;

        let message = error.to_string();
        let code = match error {
            FeatureManagerError::NotInitialized => EvaluationErrorCode::ProviderNotReady,
            FeatureManagerError::MalformedDocument(_) => EvaluationErrorCode::ParseError,
            FeatureManagerError::SourceUnavailable { .. } => {
                EvaluationErrorCode::General("Source unavailable".to_string())
            }
            FeatureManagerError::UnsupportedSource(_) => {
                EvaluationErrorCode::General("Unsupported source".to_string())
            }
            FeatureManagerError::Config(_) => {
                EvaluationErrorCode::General("Configuration error".to_string())
            }
        };
        open_feature::EvaluationError {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use open_feature::EvaluationErrorCode;

    #[test]
    fn test_json_error_converts_to_malformed_document() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: FeatureManagerError = json_error.into();

        assert!(matches!(error, FeatureManagerError::MalformedDocument(_)));
    }

    #[test]
    fn test_url_error_converts_to_config() {
        let url_error = url::Url::parse("not a url").unwrap_err();
        let error: FeatureManagerError = url_error.into();

        assert!(matches!(error, FeatureManagerError::Config(_)));
    }

    #[test]
    fn test_source_unavailable_display_includes_cause() {
        let error = FeatureManagerError::source_unavailable(SourceFailure::Status(503), "GET failed");

        assert_eq!(
            error.to_string(),
            "Source unavailable (unexpected status 503): GET failed"
        );
    }

    #[test]
    fn test_open_feature_error_mapping() {
        let not_ready: open_feature::EvaluationError = FeatureManagerError::NotInitialized.into();
        assert_eq!(not_ready.code, EvaluationErrorCode::ProviderNotReady);

        let parse: open_feature::EvaluationError =
            FeatureManagerError::MalformedDocument("bad".to_string()).into();
        assert_eq!(parse.code, EvaluationErrorCode::ParseError);
        assert!(parse.message.unwrap().contains("bad"));

        let unsupported: open_feature::EvaluationError =
            FeatureManagerError::UnsupportedSource(SourceType::Http).into();
        assert_eq!(
            unsupported.code,
            EvaluationErrorCode::General("Unsupported source".to_string())
        );
    }
}
