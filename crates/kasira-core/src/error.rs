//! # Error Types
//!
//! Domain-specific error types for kasira-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                │
//! │                                                                    │
//! │  kasira-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                   │
//! │  └── ValidationError  - Input validation failures                  │
//! │                                                                    │
//! │  kasira-db errors (separate crate)                                 │
//! │  ├── DbError          - Database operation failures                │
//! │  └── LedgerError      - CoreError | DbError, returned by the       │
//! │                         transaction coordinators                   │
//! │                                                                    │
//! │  Flow: ValidationError → CoreError → LedgerError → Caller          │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, available quantity)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations raised by the sale and
/// stock-entry coordinators. They should be caught and translated to
/// user-friendly messages by the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product variant cannot be found.
    #[error("Product variant not found: {0}")]
    VariantNotFound(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Stock entry cannot be found.
    #[error("Stock entry not found: {0}")]
    StockEntryNotFound(String),

    /// Insufficient stock to complete a sale.
    ///
    /// ## When This Occurs
    /// - The pre-flight availability check fails, or
    /// - the guarded in-transaction decrement finds less stock than the
    ///   pre-flight read saw (a concurrent sale got there first)
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// A stock entry cannot be reversed because the stock it brought in has
    /// since been consumed below the entry's contribution.
    #[error("Cannot reverse {sku}: available {available}, entry recorded {required}")]
    CannotReverse {
        sku: String,
        available: i64,
        required: i64,
    },

    /// Record is not in a state that allows the requested operation.
    ///
    /// Only COMPLETED records can be cancelled; CANCELLED is terminal.
    #[error("{entity} {id} is {status}, cannot perform operation")]
    InvalidStatus {
        entity: &'static str,
        id: String,
        status: String,
    },

    /// Cancellation requires a non-empty reason.
    #[error("Cancel reason is required")]
    MissingCancelReason,

    /// The numeric suffix of an existing document number failed to parse.
    ///
    /// Surfaced instead of silently restarting the daily counter at 1, which
    /// would mint duplicate numbers against the unique index.
    #[error("Malformed document number: {0}")]
    MalformedDocumentNumber(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements.
/// Raised before any I/O happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, bad SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "TSHIRT-RED-M".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for TSHIRT-RED-M: available 3, requested 5"
        );

        let err = CoreError::InvalidStatus {
            entity: "Sale",
            id: "abc".to_string(),
            status: "CANCELLED".to_string(),
        };
        assert_eq!(err.to_string(), "Sale abc is CANCELLED, cannot perform operation");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer name".to_string(),
        };
        assert_eq!(err.to_string(), "customer name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
