//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to open the database file
    #[error("Failed to open database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Schema could not be created or upgraded
    #[error("Failed to initialize schema: {0}")]
    Schema(#[source] rusqlite::Error),

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StorageError {
    /// Another connection held the write lock longer than the busy timeout
    pub fn is_busy(&self) -> bool {
        let err = match self {
            StorageError::Database(e) | StorageError::Schema(e) => e,
            StorageError::Open { source, .. } => source,
            StorageError::CreateDirectory { .. } => return false,
        };
        matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::Open { .. } => {
                Some("Check that the data directory is writable and the database file is not corrupted.")
            }
            _ if self.is_busy() => Some("Another process is writing to the database. Try again."),
            _ => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_directory_display() {
        let err = StorageError::CreateDirectory {
            path: PathBuf::from("/readonly/biblio"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        let msg = err.to_string();
        assert!(msg.contains("/readonly/biblio"));
        assert!(err.recovery_suggestion().is_some());
        assert!(!err.is_busy());
    }

    #[test]
    fn test_busy_detection() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err = StorageError::from(busy);

        assert!(err.is_busy());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_query_error_is_not_busy() {
        let err = StorageError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_busy());
        assert!(err.recovery_suggestion().is_none());
    }
}
