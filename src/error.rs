//! Error types for privacy-audit
//!
//! Only a few conditions are errors in this crate. Transport failures while
//! fetching a page resource are recorded on the [`FetchResult`](crate::types::FetchResult)
//! and never surface here; the audit degrades instead. What remains:
//! - configuration problems, raised before the first request is made
//! - a cycle in the task registry
//! - failing to retrieve the certificate of an `https` site, which aborts the run

use thiserror::Error;

/// Result type alias for privacy-audit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for privacy-audit
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "tasks")
        key: Option<String>,
    },

    /// The task registry contains a dependency cycle
    #[error("dependency cycle in task registry at '{0}'")]
    DependencyCycle(String),

    /// The TLS certificate of a secure-scheme host could not be retrieved
    #[error("certificate error for {host}: {reason}")]
    Certificate {
        /// Host whose certificate was requested
        host: String,
        /// Underlying failure
        reason: String,
    },

    /// HTTP client construction failed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::DependencyCycle(_) => "dependency_cycle",
            Error::Certificate { .. } => "certificate_error",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }

    /// Process exit code used by the command-line front end
    ///
    /// Follows the BSD `sysexits` convention: usage errors are 64, unavailable
    /// remote services 69, internal failures 70 and I/O failures 74.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config { .. } => 64,
            Error::Certificate { .. } | Error::Network(_) => 69,
            Error::DependencyCycle(_) | Error::Serialization(_) => 70,
            Error::Io(_) => 74,
        }
    }
}
