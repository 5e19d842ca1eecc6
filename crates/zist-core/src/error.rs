//! Error types for Zist.
//!
//! Transport and parse failures are folded into [`ZistError`]. The mutation
//! coordinator converts them into cache transitions before handing them back
//! to callers, so nothing here is fatal to the process.

use thiserror::Error;

/// Main error type for the Zist library.
#[derive(Debug, Error)]
pub enum ZistError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    #[error("GitHub API error: {message}")]
    GitHubApi {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Authentication required for {operation}")]
    Unauthenticated { operation: String },

    #[error("All resolution strategies failed for {resource}: {}", attempts.join("; "))]
    AllStrategiesFailed {
        resource: String,
        attempts: Vec<String>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Read cancelled by a pending mutation")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Zist operations.
pub type Result<T> = std::result::Result<T, ZistError>;

impl From<serde_json::Error> for ZistError {
    fn from(err: serde_json::Error) -> Self {
        ZistError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for ZistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ZistError::Timeout
        } else {
            ZistError::Network {
                message: err.to_string(),
                cause: err.url().map(|u| u.to_string()),
            }
        }
    }
}

impl ZistError {
    /// Whether this error is a rejected or unreachable request.
    ///
    /// These are the failures that roll an optimistic mutation back.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            ZistError::Network { .. }
                | ZistError::Timeout
                | ZistError::RateLimited { .. }
                | ZistError::GitHubApi { .. }
                | ZistError::NotFound { .. }
                | ZistError::Unauthenticated { .. }
                | ZistError::AllStrategiesFailed { .. }
        )
    }

    /// Whether the remote reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ZistError::NotFound { .. })
    }

    pub(crate) fn unauthenticated(operation: impl Into<String>) -> Self {
        ZistError::Unauthenticated {
            operation: operation.into(),
        }
    }
}
