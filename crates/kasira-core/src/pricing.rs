//! # Sale Pricing
//!
//! Computes line amounts and sale totals at creation time.
//!
//! ## Freezing Rule
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Amounts are computed ONCE, when the sale is created, and frozen   │
//! │  onto the sale and its items. They are never recomputed from the   │
//! │  variant afterwards, so later price changes cannot rewrite         │
//! │  history.                                                          │
//! │                                                                    │
//! │  Per line:  discount = unit_price × quantity × rate   (rounded)    │
//! │             total    = unit_price × quantity − discount            │
//! │  Per sale:  subtotal = Σ line totals                               │
//! │             total    = subtotal − sale_discount                    │
//! │                                                                    │
//! │  Invariant: Σ item.total − sale.discount == sale.total, exactly.   │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::Money;
use crate::types::DiscountRate;

// =============================================================================
// Inputs
// =============================================================================

/// One requested sale line, before pricing.
#[derive(Debug, Clone)]
pub struct SaleLineInput {
    /// Variant being sold.
    pub variant_id: String,
    /// Quantity requested (validated > 0 upstream).
    pub quantity: i64,
    /// Unit price charged for this line.
    pub unit_price: Money,
    /// Percentage discount applied to this line.
    pub discount_rate: DiscountRate,
}

// =============================================================================
// Outputs
// =============================================================================

/// A priced sale line with frozen amounts.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub variant_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount_rate: DiscountRate,
    /// Rounded discount amount for this line.
    pub discount: Money,
    /// Gross minus discount.
    pub total: Money,
}

/// All priced lines plus the sale totals.
#[derive(Debug, Clone)]
pub struct PricedSale {
    pub lines: Vec<PricedLine>,
    /// Sum of line totals.
    pub subtotal: Money,
    /// Sale-level flat discount.
    pub discount: Money,
    /// `subtotal - discount`.
    pub total: Money,
}

// =============================================================================
// Pricing Functions
// =============================================================================

/// Prices a single line.
///
/// Rounding happens once here, in [`Money::discount_amount`]; the rounded
/// value is what gets persisted.
pub fn price_line(line: &SaleLineInput) -> PricedLine {
    let gross = line.unit_price.multiply_quantity(line.quantity);
    let discount = gross.discount_amount(line.discount_rate);

    PricedLine {
        variant_id: line.variant_id.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
        discount_rate: line.discount_rate,
        discount,
        total: gross - discount,
    }
}

/// Prices a whole sale: every line plus the sale totals.
///
/// The sale-level discount is a flat amount subtracted after line discounts;
/// it is not re-distributed across lines.
pub fn price_sale(lines: &[SaleLineInput], sale_discount: Money) -> PricedSale {
    let lines: Vec<PricedLine> = lines.iter().map(price_line).collect();
    let subtotal: Money = lines.iter().map(|l| l.total).sum();

    PricedSale {
        subtotal,
        discount: sale_discount,
        total: subtotal - sale_discount,
        lines,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_price_cents: i64, discount_bps: u32) -> SaleLineInput {
        SaleLineInput {
            variant_id: "v1".to_string(),
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
            discount_rate: DiscountRate::from_bps(discount_bps),
        }
    }

    #[test]
    fn test_price_line_no_discount() {
        let priced = price_line(&line(4, 2500, 0));
        assert_eq!(priced.discount.cents(), 0);
        assert_eq!(priced.total.cents(), 10000);
    }

    #[test]
    fn test_price_line_with_discount() {
        // 3 × 10.99 = 32.97; 10% = 3.297 → 3.30; total 29.67
        let priced = price_line(&line(3, 1099, 1000));
        assert_eq!(priced.discount.cents(), 330);
        assert_eq!(priced.total.cents(), 2967);
    }

    #[test]
    fn test_price_line_full_discount() {
        let priced = price_line(&line(2, 500, 10000));
        assert_eq!(priced.discount.cents(), 1000);
        assert_eq!(priced.total.cents(), 0);
    }

    #[test]
    fn test_price_sale_totals_invariant() {
        let lines = vec![line(4, 2500, 0), line(3, 1099, 1000), line(1, 75, 333)];
        let sale_discount = Money::from_cents(500);
        let priced = price_sale(&lines, sale_discount);

        let item_sum: Money = priced.lines.iter().map(|l| l.total).sum();
        assert_eq!(priced.subtotal, item_sum);
        // The exact-arithmetic invariant: Σ item.total − discount == total.
        assert_eq!(priced.total, item_sum - sale_discount);
        assert_eq!(priced.total.cents(), 10000 + 2967 + 73 - 500);
    }

    #[test]
    fn test_price_sale_empty_discount() {
        let priced = price_sale(&[line(1, 100, 0)], Money::zero());
        assert_eq!(priced.subtotal.cents(), 100);
        assert_eq!(priced.total.cents(), 100);
    }

    #[test]
    fn test_sale_discount_can_exceed_subtotal() {
        // Preserved source behavior: the flat discount is not clamped.
        let priced = price_sale(&[line(1, 100, 0)], Money::from_cents(150));
        assert_eq!(priced.total.cents(), -50);
    }
}
