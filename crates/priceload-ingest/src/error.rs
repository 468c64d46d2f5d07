//! Error types for the ingestion pipeline
//!
//! `StoreError` tags what went wrong inside the data store so callers can
//! tell a dropped connection (worth retrying later) from data the database
//! refused (not worth retrying). `IngestError` says which stage of a run
//! failed.

use sqlx::error::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for pipeline runs
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Which constraint a write tripped over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::Unique => write!(f, "unique"),
            ConstraintKind::ForeignKey => write!(f, "foreign key"),
            ConstraintKind::NotNull => write!(f, "not-null"),
            ConstraintKind::Check => write!(f, "check"),
        }
    }
}

/// Data store failure, classified by cause
#[derive(Error, Debug)]
pub enum StoreError {
    /// The server could not be reached or the session broke
    #[error("Database connection failed: {0}")]
    Connectivity(String),

    /// A schema constraint rejected the write
    #[error("Database {kind} constraint violated: {message}")]
    Constraint { kind: ConstraintKind, message: String },

    /// The server rejected a value (SQLSTATE class 22)
    #[error("Database rejected the data: {0}")]
    Data(String),

    #[error("Database error: {0}")]
    Other(String),
}

impl StoreError {
    /// Only connectivity failures may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Constraint {
                kind: ConstraintKind::Unique,
                ..
            }
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) => {
                let message = db_err.message().to_string();
                let kind = match db_err.kind() {
                    ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
                    ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
                    ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
                    ErrorKind::CheckViolation => Some(ConstraintKind::Check),
                    _ => None,
                };
                if let Some(kind) = kind {
                    return StoreError::Constraint { kind, message };
                }
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                classify_sqlstate(&code, message)
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connectivity(err.to_string()),
            sqlx::Error::Encode(_) => StoreError::Data(err.to_string()),
            other => StoreError::Other(other.to_string()),
        }
    }
}

/// Map a server SQLSTATE that is not a constraint violation
fn classify_sqlstate(code: &str, message: String) -> StoreError {
    match code.get(..2) {
        // connection exception, operator intervention (admin shutdown etc.)
        Some("08") | Some("57") => StoreError::Connectivity(message),
        // data exception
        Some("22") => StoreError::Data(message),
        _ => StoreError::Other(message),
    }
}

/// A failed ingestion run, tagged by stage
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Only .json files can be accepted for parsing: '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not open a database session: {0}")]
    Connect(#[source] StoreError),

    #[error("Duplicate check failed: {0}")]
    DuplicateCheck(#[source] StoreError),

    #[error("This process id already exists in: process_journal.process_id ('{process_id}')")]
    DuplicateProcess { process_id: String },

    #[error("Bulk write failed: {0}")]
    Write(#[source] StoreError),

    #[error("Fetching the price table failed: {0}")]
    Fetch(#[source] StoreError),

    #[error("Journal entry failed: {0}")]
    Journal(#[source] StoreError),
}

impl IngestError {
    /// Underlying store failure, if this error came from the database
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            IngestError::Connect(e)
            | IngestError::DuplicateCheck(e)
            | IngestError::Write(e)
            | IngestError::Fetch(e)
            | IngestError::Journal(e) => Some(e),
            _ => None,
        }
    }

    /// Whether running the same file again later could succeed
    pub fn is_retryable(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_retryable)
    }
}
