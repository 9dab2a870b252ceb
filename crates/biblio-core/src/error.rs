//! Domain errors
//!
//! Every failure a request can hit maps to one `LibraryError` variant and
//! one HTTP status. Storage failures are internal: their message is meant
//! for logs, not for clients.

use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum LibraryError {
    /// A required field is missing or malformed
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Loan not found: {0}")]
    LoanNotFound(Uuid),

    /// The request clashes with existing state (duplicate email, in-use row)
    #[error("{0}")]
    Conflict(String),

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(Uuid),

    #[error("Book {0} has no available copies")]
    BookUnavailable(Uuid),

    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the role lacks the capability
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A failure outside storage that clients should not see details of
    #[error("{0}")]
    Internal(String),
}

impl LibraryError {
    pub fn validation(message: impl Into<String>) -> Self {
        LibraryError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        LibraryError::NotFound { entity, id }
    }

    /// Map this error to an HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            LibraryError::Validation(_) => 400,
            LibraryError::Unauthorized(_) => 401,
            LibraryError::Forbidden(_) => 403,
            LibraryError::NotFound { .. } | LibraryError::LoanNotFound(_) => 404,
            LibraryError::Conflict(_)
            | LibraryError::AlreadyReturned(_)
            | LibraryError::BookUnavailable(_) => 409,
            LibraryError::Storage(_) | LibraryError::Internal(_) => 500,
        }
    }
}

impl From<rusqlite::Error> for LibraryError {
    fn from(err: rusqlite::Error) -> Self {
        LibraryError::Storage(StorageError::Database(err))
    }
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;
