//! # Stock Entry Transaction Coordinator
//!
//! Creates and cancels incoming-stock entries as single atomic units: the
//! entry record, its items, the stock increments, the cost-basis update,
//! and the audit entry commit together or not at all.
//!
//! ## Reversal Checking
//! Cancelling an entry decrements stock, which CAN fail: the stock the
//! entry brought in may have been sold since. The friendly pre-check
//! produces `CannotReverse` with quantities; the authoritative check is
//! the guarded decrement inside the transaction.

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, LedgerResult};
use crate::repository::{activity, company, stock_entry, variant};
use crate::{ledger, sequence};
use kasira_core::validation::{validate_item_count, validate_price_cents, validate_quantity};
use kasira_core::{ActivityAction, CoreError, EntryStatus, Money, StockEntry, StockEntryItem};

// =============================================================================
// Inputs
// =============================================================================

/// One requested stock entry line.
#[derive(Debug, Clone)]
pub struct StockEntryLineInput {
    /// Variant receiving stock.
    pub variant_id: String,
    /// Quantity received (validated > 0).
    pub quantity: i64,
    /// Unit cost; becomes the variant's new cost basis (last entry wins).
    pub cost_price: Money,
}

/// Everything needed to create a stock entry.
#[derive(Debug, Clone)]
pub struct CreateStockEntryInput {
    pub notes: Option<String>,
    pub items: Vec<StockEntryLineInput>,
}

/// A created stock entry, fully populated.
#[derive(Debug, Clone)]
pub struct CreatedStockEntry {
    pub entry: StockEntry,
    pub items: Vec<StockEntryItem>,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Coordinates stock entry creation and cancellation.
#[derive(Debug, Clone)]
pub struct StockEntryCoordinator {
    pool: SqlitePool,
}

impl StockEntryCoordinator {
    /// Creates a new StockEntryCoordinator.
    pub fn new(pool: SqlitePool) -> Self {
        StockEntryCoordinator { pool }
    }

    /// Creates a stock entry.
    ///
    /// ## Steps
    /// 1. Validate input (no I/O)
    /// 2. In one transaction: allocate the entry number, insert entry +
    ///    items, increment stock and overwrite the cost basis per item,
    ///    append the audit entry
    ///
    /// Incoming stock has no upper-bound check.
    ///
    /// ## Errors
    /// `VariantNotFound`, validation errors, persistence failures (a
    /// concurrent allocation of the same entry number surfaces as
    /// `DbError::UniqueViolation`).
    pub async fn create_stock_entry(
        &self,
        recorded_by_id: &str,
        input: CreateStockEntryInput,
    ) -> LedgerResult<CreatedStockEntry> {
        Self::validate(&input)?;

        debug!(
            recorded_by_id = %recorded_by_id,
            item_count = input.items.len(),
            "Creating stock entry"
        );

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Variant existence check, inside the transaction for clean errors
        // before any row is written.
        for line in &input.items {
            variant::fetch_by_id(&mut *tx, &line.variant_id)
                .await?
                .ok_or_else(|| CoreError::VariantNotFound(line.variant_id.clone()))?;
        }

        let prefix = company::stock_entry_prefix(&mut *tx).await?;
        let entry_number = sequence::allocate_entry_number(&mut *tx, &prefix).await?;

        let now = Utc::now();
        let new_entry = StockEntry {
            id: Uuid::new_v4().to_string(),
            entry_number,
            recorded_by_id: recorded_by_id.to_string(),
            status: EntryStatus::Completed,
            notes: input.notes.clone(),
            cancel_reason: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        stock_entry::insert_entry(&mut *tx, &new_entry).await?;

        let mut items = Vec::with_capacity(input.items.len());
        let mut total_quantity = 0i64;
        for line in &input.items {
            let item = StockEntryItem {
                id: Uuid::new_v4().to_string(),
                stock_entry_id: new_entry.id.clone(),
                variant_id: line.variant_id.clone(),
                quantity: line.quantity,
                cost_price_cents: line.cost_price.cents(),
                created_at: now,
            };
            stock_entry::insert_item(&mut *tx, &item).await?;

            ledger::adjust(&mut *tx, &line.variant_id, line.quantity).await?;
            // Last entry wins; the historical cost stays on the item row.
            ledger::set_cost_price(&mut *tx, &line.variant_id, line.cost_price.cents()).await?;

            total_quantity += line.quantity;
            items.push(item);
        }

        activity::append(
            &mut *tx,
            recorded_by_id,
            ActivityAction::CreateStockEntry,
            "StockEntry",
            &new_entry.id,
            json!({
                "entryNumber": new_entry.entry_number,
                "itemCount": items.len(),
                "totalQuantity": total_quantity,
            }),
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            stock_entry_id = %new_entry.id,
            entry_number = %new_entry.entry_number,
            total_quantity,
            "Stock entry created"
        );

        Ok(CreatedStockEntry {
            entry: new_entry,
            items,
        })
    }

    /// Cancels a COMPLETED stock entry and reverses its stock increments.
    ///
    /// ## Reversal Precondition
    /// Every affected variant must still hold at least the quantity the
    /// entry recorded; otherwise the entry's stock has been consumed and
    /// the cancellation fails with `CannotReverse`, changing nothing.
    ///
    /// The cost basis is NOT rolled back: later entries may have
    /// overwritten it, and the original's behavior is preserved.
    ///
    /// ## Errors
    /// `MissingCancelReason`, `StockEntryNotFound`, `InvalidStatus`,
    /// `CannotReverse`.
    pub async fn cancel_stock_entry(
        &self,
        user_id: &str,
        entry_id: &str,
        reason: &str,
    ) -> LedgerResult<StockEntry> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::MissingCancelReason.into());
        }

        debug!(stock_entry_id = %entry_id, user_id = %user_id, "Cancelling stock entry");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let existing = stock_entry::fetch_by_id(&mut *tx, entry_id)
            .await?
            .ok_or_else(|| CoreError::StockEntryNotFound(entry_id.to_string()))?;

        if existing.status != EntryStatus::Completed {
            return Err(CoreError::InvalidStatus {
                entity: "StockEntry",
                id: entry_id.to_string(),
                status: existing.status.to_string(),
            }
            .into());
        }

        let items = stock_entry::fetch_items(&mut *tx, entry_id).await?;

        // Friendly pre-check with quantities; the guarded decrement below
        // is authoritative.
        for item in &items {
            let v = variant::fetch_by_id(&mut *tx, &item.variant_id)
                .await?
                .ok_or_else(|| CoreError::VariantNotFound(item.variant_id.clone()))?;

            if v.current_stock < item.quantity {
                return Err(CoreError::CannotReverse {
                    sku: v.sku,
                    available: v.current_stock,
                    required: item.quantity,
                }
                .into());
            }
        }

        if !stock_entry::mark_cancelled(&mut *tx, entry_id, reason).await? {
            // Lost a cancellation race between the read and the update.
            return Err(CoreError::InvalidStatus {
                entity: "StockEntry",
                id: entry_id.to_string(),
                status: EntryStatus::Cancelled.to_string(),
            }
            .into());
        }

        for item in &items {
            if !ledger::try_deduct(&mut *tx, &item.variant_id, item.quantity).await? {
                let (sku, available) = variant::fetch_by_id(&mut *tx, &item.variant_id)
                    .await?
                    .map(|v| (v.sku, v.current_stock))
                    .unwrap_or_else(|| (item.variant_id.clone(), 0));

                return Err(CoreError::CannotReverse {
                    sku,
                    available,
                    required: item.quantity,
                }
                .into());
            }
        }

        activity::append(
            &mut *tx,
            user_id,
            ActivityAction::CancelStockEntry,
            "StockEntry",
            entry_id,
            json!({ "reason": reason }),
        )
        .await?;

        let cancelled = stock_entry::fetch_by_id(&mut *tx, entry_id)
            .await?
            .ok_or_else(|| DbError::not_found("StockEntry", entry_id))?;

        tx.commit().await.map_err(DbError::from)?;

        info!(stock_entry_id = %entry_id, "Stock entry cancelled");

        Ok(cancelled)
    }

    /// Validates stock entry input before any I/O.
    fn validate(input: &CreateStockEntryInput) -> LedgerResult<()> {
        validate_item_count(input.items.len()).map_err(CoreError::from)?;

        for line in &input.items {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
            validate_price_cents("cost price", line.cost_price.cents())
                .map_err(CoreError::from)?;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::sale::{CreateSaleInput, CustomerSelector};
    use crate::error::LedgerError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::variant::NewVariant;
    use chrono::Local;
    use kasira_core::pricing::SaleLineInput;
    use kasira_core::{DiscountRate, PaymentMethod};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_variant(db: &Database, sku: &str, stock: i64) -> String {
        db.variants()
            .insert(NewVariant {
                sku: sku.to_string(),
                name: format!("Variant {sku}"),
                cost_price_cents: 5000,
                selling_price_cents: 9900,
                current_stock: stock,
                min_stock_level: 5,
            })
            .await
            .unwrap()
            .id
    }

    async fn variant_of(db: &Database, id: &str) -> kasira_core::ProductVariant {
        db.variants().get_by_id(id).await.unwrap().unwrap()
    }

    fn entry_input(variant_id: &str, quantity: i64, cost_cents: i64) -> CreateStockEntryInput {
        CreateStockEntryInput {
            notes: None,
            items: vec![StockEntryLineInput {
                variant_id: variant_id.to_string(),
                quantity,
                cost_price: Money::from_cents(cost_cents),
            }],
        }
    }

    async fn sell(db: &Database, variant_id: &str, quantity: i64) -> LedgerResult<()> {
        db.sale_coordinator()
            .create_sale(
                "user-1",
                CreateSaleInput {
                    customer: CustomerSelector::New {
                        name: "Budi Santoso".to_string(),
                        phone: None,
                        address: None,
                    },
                    payment_method: PaymentMethod::Cash,
                    discount: Money::zero(),
                    notes: None,
                    items: vec![SaleLineInput {
                        variant_id: variant_id.to_string(),
                        quantity,
                        unit_price: Money::from_cents(9900),
                        discount_rate: DiscountRate::zero(),
                    }],
                },
            )
            .await
            .map(|_| ())
    }

    fn today_tag() -> String {
        Local::now().date_naive().format("%y%m%d").to_string()
    }

    #[tokio::test]
    async fn test_create_entry_increments_stock_and_cost() {
        let db = setup().await;
        let variant_id = seed_variant(&db, "TSHIRT-RED-M", 10).await;

        let created = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 5, 6000))
            .await
            .unwrap();

        assert_eq!(created.entry.status, EntryStatus::Completed);
        assert_eq!(created.entry.entry_number, format!("SE-{}-0001", today_tag()));
        assert_eq!(created.items.len(), 1);

        let v = variant_of(&db, &variant_id).await;
        assert_eq!(v.current_stock, 15);
        // Last-write-wins cost basis
        assert_eq!(v.cost_price_cents, 6000);

        let log = db
            .activity()
            .for_entity("StockEntry", &created.entry.id)
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, "CREATE_STOCK_ENTRY");
    }

    #[tokio::test]
    async fn test_entry_numbers_increment_within_day() {
        let db = setup().await;
        let variant_id = seed_variant(&db, "TSHIRT-RED-M", 0).await;

        let first = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 1, 6000))
            .await
            .unwrap();
        let second = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 1, 6000))
            .await
            .unwrap();

        assert_eq!(first.entry.entry_number, format!("SE-{}-0001", today_tag()));
        assert_eq!(second.entry.entry_number, format!("SE-{}-0002", today_tag()));
    }

    #[tokio::test]
    async fn test_sell_more_than_stock_after_entry() {
        let db = setup().await;
        let variant_id = seed_variant(&db, "TSHIRT-RED-M", 10).await;

        db.stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 5, 6000))
            .await
            .unwrap();
        assert_eq!(variant_of(&db, &variant_id).await.current_stock, 15);

        let err = sell(&db, &variant_id, 20).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock {
                available: 15,
                requested: 20,
                ..
            })
        ));
        assert_eq!(variant_of(&db, &variant_id).await.current_stock, 15);
    }

    #[tokio::test]
    async fn test_create_entry_unknown_variant() {
        let db = setup().await;

        let err = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input("missing", 5, 6000))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::VariantNotFound(_))
        ));
        assert_eq!(
            db.stock_entries().list(&Default::default()).await.unwrap().total,
            0
        );
    }

    #[tokio::test]
    async fn test_create_entry_validation() {
        let db = setup().await;
        let variant_id = seed_variant(&db, "TSHIRT-RED-M", 0).await;

        let err = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", CreateStockEntryInput { notes: None, items: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::Validation(_))));

        let err = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 0, 6000))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::Validation(_))));

        let err = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 1, -5))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cancel_entry_reverses_stock() {
        let db = setup().await;
        let variant_id = seed_variant(&db, "TSHIRT-RED-M", 10).await;

        let created = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 5, 6000))
            .await
            .unwrap();
        assert_eq!(variant_of(&db, &variant_id).await.current_stock, 15);

        let cancelled = db
            .stock_entry_coordinator()
            .cancel_stock_entry("wh-1", &created.entry.id, "supplier shipment returned")
            .await
            .unwrap();

        assert_eq!(cancelled.status, EntryStatus::Cancelled);
        assert_eq!(
            cancelled.cancel_reason.as_deref(),
            Some("supplier shipment returned")
        );
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(variant_of(&db, &variant_id).await.current_stock, 10);

        // Terminal state: a second cancellation is rejected.
        let err = db
            .stock_entry_coordinator()
            .cancel_stock_entry("wh-1", &created.entry.id, "again")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InvalidStatus { .. })
        ));
        assert_eq!(variant_of(&db, &variant_id).await.current_stock, 10);
    }

    #[tokio::test]
    async fn test_cancel_entry_cannot_reverse_after_consumption() {
        let db = setup().await;
        let variant_id = seed_variant(&db, "TSHIRT-RED-M", 10).await;

        let created = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 5, 6000))
            .await
            .unwrap();

        // An intervening sale drops stock to 2, below the entry's 5.
        sell(&db, &variant_id, 13).await.unwrap();
        assert_eq!(variant_of(&db, &variant_id).await.current_stock, 2);

        let err = db
            .stock_entry_coordinator()
            .cancel_stock_entry("wh-1", &created.entry.id, "mistake")
            .await
            .unwrap_err();

        match err {
            LedgerError::Core(CoreError::CannotReverse {
                sku,
                available,
                required,
            }) => {
                assert_eq!(sku, "TSHIRT-RED-M");
                assert_eq!(available, 2);
                assert_eq!(required, 5);
            }
            other => panic!("expected CannotReverse, got {other:?}"),
        }

        // No state change
        assert_eq!(variant_of(&db, &variant_id).await.current_stock, 2);
        let entry = db
            .stock_entries()
            .get_by_id(&created.entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, EntryStatus::Completed);
    }

    #[tokio::test]
    async fn test_cancel_entry_requires_reason() {
        let db = setup().await;
        let variant_id = seed_variant(&db, "TSHIRT-RED-M", 0).await;
        let created = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 5, 6000))
            .await
            .unwrap();

        let err = db
            .stock_entry_coordinator()
            .cancel_stock_entry("wh-1", &created.entry.id, "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::MissingCancelReason)
        ));
    }

    #[tokio::test]
    async fn test_cancel_missing_entry() {
        let db = setup().await;
        let err = db
            .stock_entry_coordinator()
            .cancel_stock_entry("wh-1", "missing", "reason")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::StockEntryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_entry_listing() {
        let db = setup().await;
        let variant_id = seed_variant(&db, "TSHIRT-RED-M", 0).await;

        let created = db
            .stock_entry_coordinator()
            .create_stock_entry("wh-1", entry_input(&variant_id, 5, 6000))
            .await
            .unwrap();

        let page = db.stock_entries().list(&Default::default()).await.unwrap();
        assert_eq!(page.total, 1);

        let by_number = db
            .stock_entries()
            .list(&crate::repository::stock_entry::StockEntryFilter {
                search: Some(created.entry.entry_number.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_number.total, 1);

        let details = db
            .stock_entries()
            .get_details(&created.entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].quantity, 5);
    }
}
