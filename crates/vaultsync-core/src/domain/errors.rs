//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! validation failures for names, hashes, paths and documents.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid notebook or note file name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid content hash format (expected 64 lowercase hex characters)
    #[error("Invalid hash format: {0}")]
    InvalidHash(String),

    /// A meta or event document could not be parsed
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// An action-log line could not be parsed
    #[error("Invalid action log line: {0}")]
    InvalidLogLine(String),
}
