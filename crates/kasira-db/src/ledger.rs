//! # Stock Ledger
//!
//! The ONLY module that mutates `product_variants.current_stock` and
//! `.cost_price_cents`. Every function takes a `&mut SqliteConnection`
//! so a call can only happen on a connection the caller controls - in
//! practice, inside a coordinator transaction.
//!
//! ## Guarded Decrements
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Decrements use an atomic conditional update:                      │
//! │                                                                    │
//! │    UPDATE product_variants                                         │
//! │    SET current_stock = current_stock - ?qty                        │
//! │    WHERE id = ? AND current_stock >= ?qty                          │
//! │                                                                    │
//! │  rows_affected == 0 means the stock moved since the caller's       │
//! │  pre-flight read; the caller surfaces InsufficientStock /          │
//! │  CannotReverse and the enclosing transaction rolls back.           │
//! │                                                                    │
//! │  The schema's CHECK (current_stock >= 0) is the last backstop.     │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Applies a signed stock adjustment to a variant.
///
/// Used for increments (incoming stock, sale cancellation restores); a
/// negative delta is legal but deduction paths should prefer
/// [`try_deduct`] for its availability guard.
///
/// ## Errors
/// `DbError::NotFound` when the variant row does not exist.
pub async fn adjust(conn: &mut SqliteConnection, variant_id: &str, delta: i64) -> DbResult<()> {
    debug!(variant_id = %variant_id, delta = %delta, "Adjusting stock");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE product_variants
        SET current_stock = current_stock + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(variant_id)
    .bind(delta)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("ProductVariant", variant_id));
    }

    Ok(())
}

/// Atomically deducts stock if - and only if - enough is available.
///
/// ## Returns
/// * `Ok(true)` - stock was deducted
/// * `Ok(false)` - the variant is missing or has less than `quantity`
///   on hand; nothing was changed
pub async fn try_deduct(
    conn: &mut SqliteConnection,
    variant_id: &str,
    quantity: i64,
) -> DbResult<bool> {
    debug!(variant_id = %variant_id, quantity = %quantity, "Deducting stock");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE product_variants
        SET current_stock = current_stock - ?2,
            updated_at = ?3
        WHERE id = ?1 AND current_stock >= ?2
        "#,
    )
    .bind(variant_id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Overwrites a variant's cost basis.
///
/// Last-write-wins: each stock entry sets the cost to its own unit cost,
/// no weighted-average costing. The historical cost stays on the
/// stock entry item row.
pub async fn set_cost_price(
    conn: &mut SqliteConnection,
    variant_id: &str,
    cost_price_cents: i64,
) -> DbResult<()> {
    debug!(variant_id = %variant_id, cost = %cost_price_cents, "Updating cost price");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE product_variants
        SET cost_price_cents = ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(variant_id)
    .bind(cost_price_cents)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("ProductVariant", variant_id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::variant;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.variants()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .current_stock
    }

    async fn seed_variant(db: &Database, stock: i64) -> String {
        let v = variant::NewVariant {
            sku: "TSHIRT-RED-M".to_string(),
            name: "T-Shirt Red M".to_string(),
            cost_price_cents: 5000,
            selling_price_cents: 9900,
            current_stock: stock,
            min_stock_level: 5,
        };
        db.variants().insert(v).await.unwrap().id
    }

    #[tokio::test]
    async fn test_adjust_increments_and_decrements() {
        let db = setup().await;
        let id = seed_variant(&db, 10).await;

        // The in-memory pool holds a single connection; release it before
        // reading back through the repository.
        let mut conn = db.pool().acquire().await.unwrap();
        adjust(&mut conn, &id, 5).await.unwrap();
        drop(conn);
        assert_eq!(stock_of(&db, &id).await, 15);

        let mut conn = db.pool().acquire().await.unwrap();
        adjust(&mut conn, &id, -3).await.unwrap();
        drop(conn);
        assert_eq!(stock_of(&db, &id).await, 12);
    }

    #[tokio::test]
    async fn test_adjust_unknown_variant() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = adjust(&mut conn, "missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_try_deduct_guards_availability() {
        let db = setup().await;
        let id = seed_variant(&db, 4).await;

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(try_deduct(&mut conn, &id, 4).await.unwrap());
        drop(conn);
        assert_eq!(stock_of(&db, &id).await, 0);

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!try_deduct(&mut conn, &id, 1).await.unwrap());
        drop(conn);
        assert_eq!(stock_of(&db, &id).await, 0);
    }

    #[tokio::test]
    async fn test_try_deduct_unknown_variant_is_false() {
        let db = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!try_deduct(&mut conn, "missing", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_cost_price_overwrites() {
        let db = setup().await;
        let id = seed_variant(&db, 1).await;

        let mut conn = db.pool().acquire().await.unwrap();
        set_cost_price(&mut conn, &id, 6500).await.unwrap();
        drop(conn);

        let variant = db.variants().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(variant.cost_price_cents, 6500);
    }
}
