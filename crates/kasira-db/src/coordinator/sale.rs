//! # Sale Transaction Coordinator
//!
//! Creates and cancels sales as single atomic units: the sale record, its
//! items, the stock deduction, and the audit entry commit together or not
//! at all.
//!
//! ## Availability Checking
//! The friendly pre-flight read produces `InsufficientStock` with the
//! available quantity before anything is written. The authoritative check
//! is the guarded decrement inside the transaction
//! ([`crate::ledger::try_deduct`]); if a concurrent sale consumed the
//! stock between the two, the whole transaction rolls back.

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, LedgerResult};
use crate::repository::{activity, company, customer, sale, variant};
use crate::{ledger, sequence};
use kasira_core::pricing::{self, SaleLineInput};
use kasira_core::validation::{
    validate_discount_bps, validate_item_count, validate_name, validate_price_cents,
    validate_quantity,
};
use kasira_core::{
    ActivityAction, CoreError, Customer, Money, PaymentMethod, Sale, SaleItem, SaleStatus,
};

// =============================================================================
// Inputs
// =============================================================================

/// Identifies the customer a sale is recorded against.
#[derive(Debug, Clone)]
pub enum CustomerSelector {
    /// An existing customer by ID.
    Existing(String),
    /// A new customer, created inside the sale's transaction.
    New {
        name: String,
        phone: Option<String>,
        address: Option<String>,
    },
}

/// Everything needed to create a sale.
#[derive(Debug, Clone)]
pub struct CreateSaleInput {
    pub customer: CustomerSelector,
    pub payment_method: PaymentMethod,
    /// Sale-level flat discount, subtracted from the subtotal.
    pub discount: Money,
    pub notes: Option<String>,
    pub items: Vec<SaleLineInput>,
}

/// A created sale, fully populated.
#[derive(Debug, Clone)]
pub struct CreatedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub customer: Customer,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Coordinates sale creation and cancellation.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    pool: SqlitePool,
}

impl SaleCoordinator {
    /// Creates a new SaleCoordinator.
    pub fn new(pool: SqlitePool) -> Self {
        SaleCoordinator { pool }
    }

    /// Creates a sale.
    ///
    /// ## Steps
    /// 1. Validate input (no I/O)
    /// 2. Pre-flight: every variant exists and has enough stock
    /// 3. In one transaction: resolve/create the customer, allocate the
    ///    invoice number, insert sale + items, deduct stock (guarded),
    ///    append the audit entry
    ///
    /// ## Errors
    /// `VariantNotFound`, `CustomerNotFound`, `InsufficientStock`,
    /// validation errors, and persistence failures (a concurrent
    /// allocation of the same invoice number surfaces as
    /// `DbError::UniqueViolation`). Nothing is retried; the caller
    /// re-requests.
    pub async fn create_sale(
        &self,
        salesperson_id: &str,
        input: CreateSaleInput,
    ) -> LedgerResult<CreatedSale> {
        Self::validate(&input)?;

        debug!(
            salesperson_id = %salesperson_id,
            item_count = input.items.len(),
            "Creating sale"
        );

        // Pre-flight availability check, outside the transaction. The
        // guarded decrement below is what actually protects the ledger.
        {
            let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
            for line in &input.items {
                let v = variant::fetch_by_id(&mut conn, &line.variant_id)
                    .await?
                    .ok_or_else(|| CoreError::VariantNotFound(line.variant_id.clone()))?;

                if !v.can_fulfill(line.quantity) {
                    return Err(CoreError::InsufficientStock {
                        sku: v.sku,
                        available: v.current_stock,
                        requested: line.quantity,
                    }
                    .into());
                }
            }
        }

        let priced = pricing::price_sale(&input.items, input.discount);

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let cust = match &input.customer {
            CustomerSelector::Existing(id) => customer::fetch_by_id(&mut *tx, id)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?,
            CustomerSelector::New {
                name,
                phone,
                address,
            } => customer::insert(&mut *tx, name, phone.as_deref(), address.as_deref()).await?,
        };

        let prefix = company::invoice_prefix(&mut *tx).await?;
        let invoice_number = sequence::allocate_invoice_number(&mut *tx, &prefix).await?;

        let now = Utc::now();
        let new_sale = Sale {
            id: Uuid::new_v4().to_string(),
            invoice_number,
            customer_id: cust.id.clone(),
            salesperson_id: salesperson_id.to_string(),
            subtotal_cents: priced.subtotal.cents(),
            discount_cents: priced.discount.cents(),
            total_cents: priced.total.cents(),
            payment_method: input.payment_method,
            status: SaleStatus::Completed,
            notes: input.notes.clone(),
            cancel_reason: None,
            cancelled_at: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        };

        sale::insert_sale(&mut *tx, &new_sale).await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: new_sale.id.clone(),
                variant_id: line.variant_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                discount_bps: line.discount_rate.bps(),
                discount_cents: line.discount.cents(),
                total_cents: line.total.cents(),
                created_at: now,
            };
            sale::insert_item(&mut *tx, &item).await?;

            if !ledger::try_deduct(&mut *tx, &line.variant_id, line.quantity).await? {
                // A concurrent sale moved the stock since the pre-flight
                // read; dropping the transaction rolls everything back.
                let (sku, available) = variant::fetch_by_id(&mut *tx, &line.variant_id)
                    .await?
                    .map(|v| (v.sku, v.current_stock))
                    .unwrap_or_else(|| (line.variant_id.clone(), 0));

                return Err(CoreError::InsufficientStock {
                    sku,
                    available,
                    requested: line.quantity,
                }
                .into());
            }

            items.push(item);
        }

        activity::append(
            &mut *tx,
            salesperson_id,
            ActivityAction::CreateSale,
            "Sale",
            &new_sale.id,
            json!({
                "invoiceNumber": new_sale.invoice_number,
                "totalCents": new_sale.total_cents,
                "itemCount": items.len(),
            }),
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %new_sale.id,
            invoice_number = %new_sale.invoice_number,
            total = %new_sale.total(),
            "Sale created"
        );

        Ok(CreatedSale {
            sale: new_sale,
            items,
            customer: cust,
        })
    }

    /// Cancels a COMPLETED sale and restores its stock.
    ///
    /// ## State Machine
    /// COMPLETED → CANCELLED, terminal. Anything else is `InvalidStatus`.
    /// The transition is enforced by a conditional UPDATE inside the
    /// transaction, so racing cancellations cannot both restore stock.
    ///
    /// ## Errors
    /// `MissingCancelReason`, `SaleNotFound`, `InvalidStatus`.
    pub async fn cancel_sale(
        &self,
        user_id: &str,
        sale_id: &str,
        reason: &str,
    ) -> LedgerResult<Sale> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::MissingCancelReason.into());
        }

        debug!(sale_id = %sale_id, user_id = %user_id, "Cancelling sale");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let existing = sale::fetch_by_id(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if existing.status != SaleStatus::Completed {
            return Err(CoreError::InvalidStatus {
                entity: "Sale",
                id: sale_id.to_string(),
                status: existing.status.to_string(),
            }
            .into());
        }

        let items = sale::fetch_items(&mut *tx, sale_id).await?;

        if !sale::mark_cancelled(&mut *tx, sale_id, reason, user_id).await? {
            // Lost a cancellation race between the read and the update.
            return Err(CoreError::InvalidStatus {
                entity: "Sale",
                id: sale_id.to_string(),
                status: SaleStatus::Cancelled.to_string(),
            }
            .into());
        }

        // Restoring stock cannot go negative, no guard needed.
        for item in &items {
            ledger::adjust(&mut *tx, &item.variant_id, item.quantity).await?;
        }

        activity::append(
            &mut *tx,
            user_id,
            ActivityAction::CancelSale,
            "Sale",
            sale_id,
            json!({ "reason": reason }),
        )
        .await?;

        let cancelled = sale::fetch_by_id(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale_id, "Sale cancelled");

        Ok(cancelled)
    }

    /// Validates sale input before any I/O.
    fn validate(input: &CreateSaleInput) -> LedgerResult<()> {
        validate_item_count(input.items.len()).map_err(CoreError::from)?;
        validate_price_cents("sale discount", input.discount.cents()).map_err(CoreError::from)?;

        if let CustomerSelector::New { name, .. } = &input.customer {
            validate_name("customer name", name).map_err(CoreError::from)?;
        }

        for line in &input.items {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
            validate_price_cents("unit price", line.unit_price.cents())
                .map_err(CoreError::from)?;
            validate_discount_bps(line.discount_rate.bps()).map_err(CoreError::from)?;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
