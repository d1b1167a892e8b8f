//! # Database Error Types
//!
//! Error types for database operations and the coordinator umbrella error.
//!
//! ## Error Flow
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                               │
//! │                                                                    │
//! │  SQLite Error (sqlx::Error)                                        │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  DbError (this module) ← adds context and categorization           │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  LedgerError (this module) ← DbError | CoreError, returned by      │
//! │       │                      the transaction coordinators          │
//! │       ▼                                                            │
//! │  Caller maps to a user-facing message; nothing is retried here     │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use kasira_core::CoreError;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate SKU
    /// - A concurrent creation generated the same invoice/entry number
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// LedgerError
// =============================================================================

/// Umbrella error returned by the transaction coordinators.
///
/// A coordinator operation can fail on a business rule (CoreError) or on
/// persistence (DbError); both roll back the whole atomic phase.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Business rule violation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Db(err.into())
    }
}

impl From<kasira_core::ValidationError> for LedgerError {
    fn from(err: kasira_core::ValidationError) -> Self {
        LedgerError::Core(err.into())
    }
}

/// Result type for coordinator operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_ledger_error_wraps_core() {
        let err: LedgerError = CoreError::MissingCancelReason.into();
        assert_eq!(err.to_string(), "Cancel reason is required");
    }

    #[test]
    fn test_ledger_error_wraps_db() {
        let err: LedgerError = DbError::not_found("Sale", "abc").into();
        assert_eq!(err.to_string(), "Sale not found: abc");
    }
}
