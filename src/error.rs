//! Error types for schema conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the caller by loading and configuration.
///
/// Conversion itself never fails; per-document problems degrade to
/// defaults and are collected as [`crate::Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ConvertError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::FileNotFound { .. } | ConvertError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ConvertError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_exit_code() {
        let err = ConvertError::FileNotFound {
            path: PathBuf::from("Chassis.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ConvertError::ReadError {
            path: PathBuf::from("Chassis.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn parse_errors_exit_code() {
        let err = ConvertError::InvalidJson {
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ConvertError::InvalidConfig {
            message: "missing info block".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }
}
