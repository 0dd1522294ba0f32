// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Error types for BDA

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BdaError {
    /// Unknown logical database, duplicate binding or invalid settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Submission error: {0}")]
    Submission(String),

    #[error("Poll error: {0}")]
    Poll(String),

    #[error("Query {handle} failed: {reason}")]
    QueryFailed { handle: String, reason: String },

    #[error("Query {0} was cancelled by the service")]
    QueryCancelled(String),

    #[error("Query {0} returned no column metadata")]
    EmptyMetadata(String),

    #[error("Pagination error: {0}")]
    Pagination(String),

    #[error("Cannot convert {value:?} to {declared_type} for column {column}")]
    Conversion {
        column: String,
        declared_type: String,
        value: String,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    /// Aborted through the caller's cancellation token
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Raised by service implementations; the engine rewraps it per phase
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Blob not found: {bucket}/{key}")]
    BlobNotFound { bucket: String, key: String },

    #[error("Blob store error: {0}")]
    BlobStore(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BdaError>;

impl BdaError {
    /// Message to carry into a phase-specific error.
    ///
    /// Transport errors give their bare payload so the rewrapped message
    /// does not stack two prefixes.
    pub fn into_detail(self) -> String {
        match self {
            BdaError::Transport(message) => message,
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_detail_has_no_prefix() {
        let err = BdaError::Transport("connection refused".to_string());
        assert_eq!(err.into_detail(), "connection refused");

        let err = BdaError::InvalidArgument("bad token".to_string());
        assert_eq!(err.into_detail(), "Invalid argument: bad token");
    }

    #[test]
    fn test_rewrapped_submission_message() {
        let err = BdaError::Submission(BdaError::Transport("connection refused".to_string()).into_detail());
        assert_eq!(err.to_string(), "Submission error: connection refused");
    }
}
