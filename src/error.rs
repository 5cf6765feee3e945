/// Unified error types for AR Works
use serde::Serialize;
use thiserror::Error;

/// Main error type for work operations
#[derive(Error, Debug)]
pub enum WorkError {
    /// A mandatory file slot would end up empty
    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    /// A referenced work or sub-resource does not belong to the requester
    #[error("Ownership violation: {0}")]
    OwnershipViolation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors (bad input, rejected uploads, unknown references)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Relational store errors
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    /// File store errors
    #[error("File operation failed: {0}")]
    FileOperation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable classification surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    StructuralViolation,
    OwnershipViolation,
    NotFound,
    InvalidRequest,
    StorageFailure,
    FileOperationFailure,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::StructuralViolation => "StructuralViolation",
            ErrorKind::OwnershipViolation => "OwnershipViolation",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::StorageFailure => "StorageFailure",
            ErrorKind::FileOperationFailure => "FileOperationFailure",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

/// Error body handed to the request layer
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl WorkError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkError::StructuralViolation(_) => ErrorKind::StructuralViolation,
            WorkError::OwnershipViolation(_) => ErrorKind::OwnershipViolation,
            WorkError::NotFound(_) => ErrorKind::NotFound,
            WorkError::Validation(_) => ErrorKind::InvalidRequest,
            WorkError::Storage(_) => ErrorKind::StorageFailure,
            WorkError::FileOperation(_) | WorkError::Io(_) => ErrorKind::FileOperationFailure,
            WorkError::Config(_) | WorkError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Human-readable message that never carries raw engine output
    pub fn public_message(&self) -> String {
        match self {
            WorkError::Storage(_) => "Storage failure".to_string(),
            WorkError::Io(_) | WorkError::FileOperation(_) => "File operation failed".to_string(),
            WorkError::Config(_) | WorkError::Internal(_) => "Internal error".to_string(), // Don't leak details
            _ => self.to_string(),
        }
    }

    /// Build the caller-facing error body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.kind().as_str().to_string(),
            message: self.public_message(),
        }
    }

    /// Translate foreign-key failures into validation errors
    ///
    /// Anything else passes through untouched.
    pub fn from_constraint(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return WorkError::Validation(format!("Referenced {} does not exist", what));
            }
        }
        WorkError::Storage(err)
    }
}

/// Result type alias for work operations
pub type WorkResult<T> = Result<T, WorkError>;
