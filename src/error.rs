//! Unified error handling for the impfwatch crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors usable on their own.
//!
//! # Architecture
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::utils::error::{FetchError, ParseError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, upstream status)
    Network,
    /// Decoding and value parsing errors
    Parsing,
    /// Metric registration and encoding errors
    Metrics,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Metrics => "metrics",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the impfwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Prometheus registration or encoding errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if this error is recoverable (a later scrape may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Metrics(_) | Self::Config(_) | Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::Decode { .. }) => ErrorCategory::Parsing,
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Metrics(_) => ErrorCategory::Metrics,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(FetchError::Timeout {
            url: "http://upstream".to_string(),
        });
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let metrics_err: Error = prometheus::Error::Msg("duplicate".to_string()).into();
        assert_eq!(metrics_err.category(), ErrorCategory::Metrics);
    }

    #[test]
    fn test_decode_counts_as_parsing() {
        let source = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err = Error::Fetch(FetchError::Decode {
            url: "http://upstream".to_string(),
            source,
        });
        assert_eq!(err.category(), ErrorCategory::Parsing);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_is_recoverable() {
        let fetch_err = Error::Fetch(FetchError::Status {
            url: "http://upstream".to_string(),
            status: 502,
        });
        assert!(fetch_err.is_recoverable());

        let config_err = Error::config("region must not be empty");
        assert!(!config_err.is_recoverable());
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("Invalid bind address");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert_eq!(err.category().as_str(), "config");
    }

    #[test]
    fn test_error_with_source() {
        let source = String::from_utf8(vec![0xff]).unwrap_err();
        let err = Error::with_source("Metrics output is not UTF-8", source);
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.to_string(), "Metrics output is not UTF-8");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_fetch_error_converts() {
        let err: Error = FetchError::InvalidUrl("::nope::".to_string()).into();
        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(err.category(), ErrorCategory::Network);
    }
}
