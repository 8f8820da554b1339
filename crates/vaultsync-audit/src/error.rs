//! Audit error types

use std::path::PathBuf;

use thiserror::Error;
use vaultsync_core::domain::DomainError;

/// Errors raised while reading the action log
#[derive(Debug, Error)]
pub enum AuditError {
    /// The log file could not be read
    #[error("Failed to read action log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line did not parse as an action entry
    #[error("Malformed action log line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: DomainError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuditError::Malformed {
            line: 3,
            source: DomainError::InvalidLogLine("x".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Malformed action log line 3: Invalid action log line: x"
        );
    }
}
