//! # Domain Types
//!
//! Core domain types used throughout Kasira.
//!
//! ## Type Hierarchy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                               │
//! │                                                                    │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐     │
//! │  │ ProductVariant │   │      Sale      │   │   StockEntry   │     │
//! │  │ ────────────── │   │ ────────────── │   │ ────────────── │     │
//! │  │ id (UUID)      │   │ id (UUID)      │   │ id (UUID)      │     │
//! │  │ sku (business) │   │ invoice_number │   │ entry_number   │     │
//! │  │ current_stock  │   │ status         │   │ status         │     │
//! │  │ cost/sell price│   │ total_cents    │   │ recorded_by_id │     │
//! │  └────────────────┘   └───────┬────────┘   └───────┬────────┘     │
//! │                               │                    │              │
//! │                        ┌──────┴───────┐    ┌───────┴────────┐     │
//! │                        │   SaleItem   │    │ StockEntryItem │     │
//! │                        │ frozen price │    │ frozen cost    │     │
//! │                        └──────────────┘    └────────────────┘     │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where applicable: (sku, invoice_number, entry_number) -
//!   human-readable, unique

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Percentage discount represented in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000, so 1000 bps = 10%.
/// Valid range for a line discount is 0..=10000 (0% to 100%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a discount rate from a percentage (for convenience).
    pub fn from_percent(pct: f64) -> Self {
        DiscountRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Product Variant
// =============================================================================

/// A specific sellable configuration of a product (e.g. size + colour),
/// carrying its own SKU, prices, and stock count.
///
/// `current_stock` is the single source of truth for availability and is
/// mutated only by the stock ledger, inside a coordinator transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductVariant {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Display name shown on documents.
    pub name: String,

    /// Cost basis in cents. Overwritten by each stock entry (last entry wins).
    pub cost_price_cents: i64,

    /// Selling price in cents.
    pub selling_price_cents: i64,

    /// On-hand quantity. Must never go negative.
    pub current_stock: i64,

    /// Reorder threshold for low-stock reporting.
    pub min_stock_level: i64,

    /// Whether the variant is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Checks whether the requested quantity can be fulfilled from stock.
    #[inline]
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }

    /// Checks whether stock has fallen to or below the reorder threshold.
    #[inline]
    pub fn is_below_min_stock(&self) -> bool {
        self.current_stock <= self.min_stock_level
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer a sale is recorded against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// The only transition performed here is COMPLETED → CANCELLED (terminal).
/// VOIDED is a representable historical value; no operation produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Sale has been recorded and stock deducted.
    Completed,
    /// Sale was cancelled and stock restored.
    Cancelled,
    /// Sale was voided (legacy value, never produced here).
    Voided,
}

impl SaleStatus {
    /// Stable uppercase name, as persisted.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "COMPLETED",
            SaleStatus::Cancelled => "CANCELLED",
            SaleStatus::Voided => "VOIDED",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Stock Entry Status
// =============================================================================

/// The status of an incoming-stock entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Entry has been recorded and stock incremented.
    Completed,
    /// Entry was cancelled and the increment reversed.
    Cancelled,
}

impl EntryStatus {
    /// Stable uppercase name, as persisted.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Completed => "COMPLETED",
            EntryStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    CreditCard,
    DebitCard,
    Ewallet,
    Other,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale transaction.
///
/// Created in one atomic unit together with its items, the stock deduction,
/// and the audit entry. Totals are computed at creation time and frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Day-scoped sequential business identifier, e.g. `INV-260807-0001`.
    pub invoice_number: String,

    pub customer_id: String,
    pub salesperson_id: String,

    /// Sum of item totals, in cents.
    pub subtotal_cents: i64,

    /// Sale-level flat discount, in cents.
    pub discount_cents: i64,

    /// `subtotal_cents - discount_cents`.
    pub total_cents: i64,

    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,

    pub cancel_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// User who approved the cancellation.
    pub approved_by: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Returns the sale-level discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// All amounts are computed at creation time and frozen; they are never
/// recomputed from the variant afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub variant_id: String,

    /// Quantity sold.
    pub quantity: i64,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// Line discount rate in basis points (0..=10000).
    pub discount_bps: u32,

    /// Discount amount in cents: `unit_price × quantity × rate`, rounded.
    pub discount_cents: i64,

    /// Line total in cents: `unit_price × quantity - discount`.
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the discount rate.
    #[inline]
    pub fn discount_rate(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps)
    }
}

// =============================================================================
// Stock Entry
// =============================================================================

/// An incoming-stock record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockEntry {
    pub id: String,

    /// Day-scoped sequential business identifier, e.g. `SE-260807-0001`.
    pub entry_number: String,

    pub recorded_by_id: String,
    pub status: EntryStatus,
    pub notes: Option<String>,

    pub cancel_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Entry Item
// =============================================================================

/// A line item in a stock entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockEntryItem {
    pub id: String,
    pub stock_entry_id: String,
    pub variant_id: String,

    /// Quantity received.
    pub quantity: i64,

    /// Unit cost in cents. Becomes the variant's cost basis at entry time.
    pub cost_price_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl StockEntryItem {
    /// Returns the unit cost as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }
}

// =============================================================================
// Activity Log
// =============================================================================

/// Mutating actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    CreateSale,
    CancelSale,
    CreateStockEntry,
    CancelStockEntry,
}

impl ActivityAction {
    /// Stable uppercase name, as persisted.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::CreateSale => "CREATE_SALE",
            ActivityAction::CancelSale => "CANCEL_SALE",
            ActivityAction::CreateStockEntry => "CREATE_STOCK_ENTRY",
            ActivityAction::CancelStockEntry => "CANCEL_STOCK_ENTRY",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An append-only audit record of a mutating action.
///
/// Written in the same transaction as the mutation it describes; never
/// updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    /// Action name, e.g. "CREATE_SALE".
    pub action: String,
    /// Entity type the action touched: "Sale" or "StockEntry".
    pub entity_type: String,
    pub entity_id: String,
    /// JSON payload with action-specific details.
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Company Profile
// =============================================================================

/// Singleton company settings row.
///
/// Supplies the document number prefixes; everything else on it is
/// presentation data for printed documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CompanyProfile {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub invoice_prefix: String,
    pub stock_entry_prefix: String,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_rate_from_bps() {
        let rate = DiscountRate::from_bps(1250);
        assert_eq!(rate.bps(), 1250);
        assert!((rate.percent() - 12.5).abs() < 0.001);
    }

    #[test]
    fn test_discount_rate_from_percent() {
        let rate = DiscountRate::from_percent(12.5);
        assert_eq!(rate.bps(), 1250);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(SaleStatus::Completed.as_str(), "COMPLETED");
        assert_eq!(SaleStatus::Cancelled.to_string(), "CANCELLED");
        assert_eq!(EntryStatus::Cancelled.as_str(), "CANCELLED");
        assert_eq!(ActivityAction::CreateStockEntry.as_str(), "CREATE_STOCK_ENTRY");
    }

    #[test]
    fn test_payment_method_default() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_variant_can_fulfill() {
        let now = Utc::now();
        let variant = ProductVariant {
            id: "v1".to_string(),
            sku: "TSHIRT-RED-M".to_string(),
            name: "T-Shirt Red M".to_string(),
            cost_price_cents: 5000,
            selling_price_cents: 9900,
            current_stock: 10,
            min_stock_level: 5,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(variant.can_fulfill(10));
        assert!(!variant.can_fulfill(11));
        assert!(!variant.is_below_min_stock());
    }

    #[test]
    fn test_status_serde_wire_names() {
        let json = serde_json::to_string(&SaleStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"BANK_TRANSFER\"");
    }
}
