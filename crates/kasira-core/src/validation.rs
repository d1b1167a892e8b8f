//! # Validation Module
//!
//! Input validation executed before any I/O.
//!
//! ## Validation Strategy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                             │
//! │                                                                    │
//! │  Layer 1: Caller (form/API layer, out of scope here)               │
//! │           │                                                        │
//! │           ▼                                                        │
//! │  Layer 2: THIS MODULE - field rules, before the coordinator        │
//! │           touches the database                                     │
//! │           │                                                        │
//! │           ▼                                                        │
//! │  Layer 3: Database - NOT NULL, UNIQUE, FK, CHECK constraints       │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use kasira_core::validation::validate_sku;
///
/// assert!(validate_sku("TSHIRT-RED-M").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an entity display name (variant, customer, company).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0); zero is allowed (free items)
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "discount rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the item list of a sale or stock entry.
///
/// ## Rules
/// - At least one item
/// - At most MAX_SALE_ITEMS
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use kasira_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TSHIRT-RED-M").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("variant_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("customer name", "Budi Santoso").is_ok());
        assert!(validate_name("customer name", "").is_err());
        assert!(validate_name("customer name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents("unit price", 0).is_ok());
        assert!(validate_price_cents("unit price", 1099).is_ok());
        assert!(validate_price_cents("unit price", -100).is_err());
    }

    #[test]
    fn test_validate_discount_bps() {
        assert!(validate_discount_bps(0).is_ok());
        assert!(validate_discount_bps(10000).is_ok());
        assert!(validate_discount_bps(10001).is_err());
    }

    #[test]
    fn test_validate_item_count() {
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(101).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }
}
