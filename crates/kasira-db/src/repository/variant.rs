//! # Variant Repository
//!
//! Database operations for product variants.
//!
//! Stock and cost-basis mutations are NOT here - they live in
//! [`crate::ledger`] and only run inside coordinator transactions. This
//! repository covers catalog maintenance and reads.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, LedgerResult};
use kasira_core::validation::{validate_name, validate_price_cents, validate_sku};
use kasira_core::{CoreError, ProductVariant};

/// Columns selected for a full variant row.
const VARIANT_COLUMNS: &str = r#"
    id, sku, name, cost_price_cents, selling_price_cents,
    current_stock, min_stock_level, is_active, created_at, updated_at
"#;

// =============================================================================
// Inputs
// =============================================================================

/// Fields for creating a new variant.
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub sku: String,
    pub name: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    /// Opening stock. Subsequent changes go through stock entries.
    pub current_stock: i64,
    pub min_stock_level: i64,
}

// =============================================================================
// Transaction-Scoped Reads
// =============================================================================

/// Fetches a variant on the caller's connection.
///
/// Used by the coordinators to re-read inside their transaction after a
/// guarded deduction refuses.
pub async fn fetch_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<ProductVariant>> {
    let variant = sqlx::query_as::<_, ProductVariant>(&format!(
        "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(variant)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for variant database operations.
#[derive(Debug, Clone)]
pub struct VariantRepository {
    pool: SqlitePool,
}

impl VariantRepository {
    /// Creates a new VariantRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VariantRepository { pool }
    }

    /// Gets a variant by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductVariant>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Gets a variant by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Inserts a new variant.
    ///
    /// ## Returns
    /// * `Ok(ProductVariant)` - the inserted variant
    /// * `Err(LedgerError::Db(UniqueViolation))` - SKU already exists
    pub async fn insert(&self, new: NewVariant) -> LedgerResult<ProductVariant> {
        validate_sku(&new.sku).map_err(CoreError::from)?;
        validate_name("variant name", &new.name).map_err(CoreError::from)?;
        validate_price_cents("cost price", new.cost_price_cents).map_err(CoreError::from)?;
        validate_price_cents("selling price", new.selling_price_cents).map_err(CoreError::from)?;

        debug!(sku = %new.sku, "Inserting variant");

        let now = Utc::now();
        let variant = ProductVariant {
            id: Uuid::new_v4().to_string(),
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            cost_price_cents: new.cost_price_cents,
            selling_price_cents: new.selling_price_cents,
            current_stock: new.current_stock,
            min_stock_level: new.min_stock_level,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO product_variants (
                id, sku, name, cost_price_cents, selling_price_cents,
                current_stock, min_stock_level, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&variant.id)
        .bind(&variant.sku)
        .bind(&variant.name)
        .bind(variant.cost_price_cents)
        .bind(variant.selling_price_cents)
        .bind(variant.current_stock)
        .bind(variant.min_stock_level)
        .bind(variant.is_active)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(variant)
    }

    /// Updates a variant's catalog fields (name, prices, reorder level).
    ///
    /// Stock is deliberately NOT updatable here; it moves only through
    /// stock entries and sales.
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        selling_price_cents: i64,
        min_stock_level: i64,
    ) -> DbResult<()> {
        debug!(id = %id, "Updating variant");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE product_variants SET
                name = ?2,
                selling_price_cents = ?3,
                min_stock_level = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(selling_price_cents)
        .bind(min_stock_level)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductVariant", id));
        }

        Ok(())
    }

    /// Lists active variants, optionally filtered by a SKU/name substring.
    ///
    /// Callers selling from this list should still expect
    /// `InsufficientStock` at sale time; the listing is not a reservation.
    pub async fn list_active(&self, search: Option<&str>, limit: u32) -> DbResult<Vec<ProductVariant>> {
        let pattern = format!("%{}%", search.unwrap_or("").trim());

        let variants = sqlx::query_as::<_, ProductVariant>(&format!(
            r#"
            SELECT {VARIANT_COLUMNS} FROM product_variants
            WHERE is_active = 1 AND (sku LIKE ?1 OR name LIKE ?1)
            ORDER BY name
            LIMIT ?2
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    /// Lists active variants at or below their reorder threshold.
    pub async fn list_low_stock(&self, limit: u32) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(&format!(
            r#"
            SELECT {VARIANT_COLUMNS} FROM product_variants
            WHERE is_active = 1 AND current_stock <= min_stock_level
            ORDER BY current_stock ASC, name
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    /// Soft-deletes a variant by setting is_active = false.
    ///
    /// Historical sales and stock entries keep referencing the row.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating variant");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE product_variants SET
                is_active = 0,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductVariant", id));
        }

        Ok(())
    }

    /// Counts active variants (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_variants WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::pool::{Database, DbConfig};

    fn new_variant(sku: &str, stock: i64) -> NewVariant {
        NewVariant {
            sku: sku.to_string(),
            name: format!("Variant {sku}"),
            cost_price_cents: 5000,
            selling_price_cents: 9900,
            current_stock: stock,
            min_stock_level: 5,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.variants().insert(new_variant("TSHIRT-RED-M", 10)).await.unwrap();

        let by_id = db.variants().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.sku, "TSHIRT-RED-M");
        assert_eq!(by_id.current_stock, 10);
        assert!(by_id.is_active);

        let by_sku = db.variants().get_by_sku("TSHIRT-RED-M").await.unwrap().unwrap();
        assert_eq!(by_sku.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.variants().insert(new_variant("TSHIRT-RED-M", 10)).await.unwrap();

        let err = db.variants().insert(new_variant("TSHIRT-RED-M", 3)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Db(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_invalid_sku_rejected_before_io() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.variants().insert(new_variant("has space", 1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_active_and_search() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.variants().insert(new_variant("TSHIRT-RED-M", 10)).await.unwrap();
        db.variants().insert(new_variant("HOODIE-BLK-L", 4)).await.unwrap();

        let all = db.variants().list_active(None, 20).await.unwrap();
        assert_eq!(all.len(), 2);

        let hits = db.variants().list_active(Some("HOODIE"), 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "HOODIE-BLK-L");
    }

    #[tokio::test]
    async fn test_list_low_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.variants().insert(new_variant("TSHIRT-RED-M", 10)).await.unwrap();
        db.variants().insert(new_variant("HOODIE-BLK-L", 4)).await.unwrap();

        let low = db.variants().list_low_stock(20).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku, "HOODIE-BLK-L");
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let v = db.variants().insert(new_variant("TSHIRT-RED-M", 10)).await.unwrap();

        db.variants().deactivate(&v.id).await.unwrap();
        assert_eq!(db.variants().list_active(None, 20).await.unwrap().len(), 0);
        assert_eq!(db.variants().count().await.unwrap(), 0);
    }
}
