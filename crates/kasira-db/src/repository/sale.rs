//! # Sale Repository
//!
//! Reads and listings for sales, plus the connection-scoped writes used
//! by the sale coordinator.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  1. CREATE (SaleCoordinator::create_sale, one transaction)         │
//! │     └── insert_sale + insert_item×N → Sale { status: Completed }   │
//! │                                                                    │
//! │  2. (OPTIONAL) CANCEL (SaleCoordinator::cancel_sale)               │
//! │     └── mark_cancelled → Sale { status: Cancelled }  (terminal)    │
//! │                                                                    │
//! │  There is no draft state: a sale exists only once it is complete.  │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasira_core::{Customer, Sale, SaleItem, SaleStatus};

/// Columns selected for a full sale row, qualified for joined queries.
const SALE_COLUMNS: &str = r#"
    s.id, s.invoice_number, s.customer_id, s.salesperson_id,
    s.subtotal_cents, s.discount_cents, s.total_cents,
    s.payment_method, s.status, s.notes,
    s.cancel_reason, s.cancelled_at, s.approved_by,
    s.created_at, s.updated_at
"#;

/// Columns selected for a full sale item row.
const SALE_ITEM_COLUMNS: &str = r#"
    id, sale_id, variant_id, quantity, unit_price_cents,
    discount_bps, discount_cents, total_cents, created_at
"#;

// =============================================================================
// Listing Types
// =============================================================================

/// Page size used by listings.
pub const PAGE_SIZE: u32 = 10;

/// Filters for listing sales.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Inclusive lower bound on creation time.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub end: Option<DateTime<Utc>>,
    pub salesperson_id: Option<String>,
    pub status: Option<SaleStatus>,
    /// Substring match on invoice number or customer name.
    pub search: Option<String>,
    /// 1-based page number; 0 is treated as 1.
    pub page: u32,
}

/// One page of sales plus pagination data.
#[derive(Debug, Clone)]
pub struct SalePage {
    pub sales: Vec<Sale>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}

/// A sale with its items and customer resolved.
#[derive(Debug, Clone)]
pub struct SaleDetails {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub customer: Customer,
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Fetches a sale on the caller's connection.
pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales s WHERE s.id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(sale)
}

/// Fetches a sale's items on the caller's connection.
pub async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
    ))
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

/// Returns today's highest invoice number for the given prefix, if any.
///
/// `since` is the local-midnight day boundary. Scoping by prefix keeps a
/// mid-day prefix change from feeding a foreign number into the counter
/// parse; lexicographic ordering is correct within (day, prefix) because
/// the counter suffix is zero-padded.
pub async fn latest_invoice_number(
    conn: &mut SqliteConnection,
    since: DateTime<Utc>,
    prefix: &str,
) -> DbResult<Option<String>> {
    let pattern = format!("{prefix}-%");

    let number: Option<String> = sqlx::query_scalar(
        r#"
        SELECT invoice_number FROM sales
        WHERE created_at >= ?1 AND invoice_number LIKE ?2
        ORDER BY invoice_number DESC
        LIMIT 1
        "#,
    )
    .bind(since)
    .bind(pattern)
    .fetch_optional(conn)
    .await?;

    Ok(number)
}

/// Inserts a sale row on the caller's connection.
pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, invoice_number = %sale.invoice_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, invoice_number, customer_id, salesperson_id,
            subtotal_cents, discount_cents, total_cents,
            payment_method, status, notes,
            cancel_reason, cancelled_at, approved_by,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7,
            ?8, ?9, ?10,
            ?11, ?12, ?13,
            ?14, ?15
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.invoice_number)
    .bind(&sale.customer_id)
    .bind(&sale.salesperson_id)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(&sale.notes)
    .bind(&sale.cancel_reason)
    .bind(sale.cancelled_at)
    .bind(&sale.approved_by)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts a sale item row on the caller's connection.
///
/// All amounts were frozen by pricing before this point.
pub async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, variant_id, quantity, unit_price_cents,
            discount_bps, discount_cents, total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.variant_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.discount_bps)
    .bind(item.discount_cents)
    .bind(item.total_cents)
    .bind(item.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Marks a COMPLETED sale as cancelled.
///
/// The status guard is part of the UPDATE so two racing cancellations
/// cannot both succeed.
///
/// ## Returns
/// Whether a row transitioned.
pub async fn mark_cancelled(
    conn: &mut SqliteConnection,
    id: &str,
    reason: &str,
    approved_by: &str,
) -> DbResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE sales SET
            status = 'CANCELLED',
            cancel_reason = ?2,
            cancelled_at = ?3,
            approved_by = ?4,
            updated_at = ?3
        WHERE id = ?1 AND status = 'COMPLETED'
        "#,
    )
    .bind(id)
    .bind(reason)
    .bind(now)
    .bind(approved_by)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale reads and listings.
///
/// All writes happen through [`crate::coordinator::sale::SaleCoordinator`].
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, sale_id).await
    }

    /// Gets a sale with its items and customer.
    pub async fn get_details(&self, id: &str) -> DbResult<Option<SaleDetails>> {
        let mut conn = self.pool.acquire().await?;

        let sale = match fetch_by_id(&mut conn, id).await? {
            Some(sale) => sale,
            None => return Ok(None),
        };

        let items = fetch_items(&mut conn, id).await?;
        let customer = super::customer::fetch_by_id(&mut conn, &sale.customer_id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", &sale.customer_id))?;

        Ok(Some(SaleDetails {
            sale,
            items,
            customer,
        }))
    }

    /// Lists sales matching the filter, newest first, paginated.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<SalePage> {
        let page = filter.page.max(1);
        let offset = (page - 1) * PAGE_SIZE;

        let (where_sql, search_pattern) = Self::where_clause(filter);

        let list_sql = format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            {where_sql}
            ORDER BY s.created_at DESC
            LIMIT ? OFFSET ?
            "#
        );

        let count_sql = format!(
            r#"
            SELECT COUNT(*) FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            {where_sql}
            "#
        );

        let mut list_query = sqlx::query_as::<_, Sale>(&list_sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);

        if let Some(start) = filter.start {
            list_query = list_query.bind(start);
            count_query = count_query.bind(start);
        }
        if let Some(end) = filter.end {
            list_query = list_query.bind(end);
            count_query = count_query.bind(end);
        }
        if let Some(salesperson_id) = &filter.salesperson_id {
            list_query = list_query.bind(salesperson_id);
            count_query = count_query.bind(salesperson_id);
        }
        if let Some(status) = filter.status {
            list_query = list_query.bind(status);
            count_query = count_query.bind(status);
        }
        if let Some(pattern) = &search_pattern {
            // The search clause holds two `?` placeholders
            list_query = list_query.bind(pattern).bind(pattern);
            count_query = count_query.bind(pattern).bind(pattern);
        }

        let sales = list_query
            .bind(PAGE_SIZE)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total = count_query.fetch_one(&self.pool).await?;

        Ok(SalePage {
            sales,
            page,
            page_size: PAGE_SIZE,
            total,
            total_pages: (total + PAGE_SIZE as i64 - 1) / PAGE_SIZE as i64,
        })
    }

    /// Builds the WHERE clause and the LIKE pattern for a filter.
    ///
    /// Placeholders are unnumbered `?`; binds must follow clause order:
    /// start, end, salesperson, status, search (twice), then LIMIT/OFFSET.
    fn where_clause(filter: &SaleFilter) -> (String, Option<String>) {
        let mut clauses: Vec<&str> = Vec::new();

        if filter.start.is_some() {
            clauses.push("s.created_at >= ?");
        }
        if filter.end.is_some() {
            clauses.push("s.created_at <= ?");
        }
        if filter.salesperson_id.is_some() {
            clauses.push("s.salesperson_id = ?");
        }
        if filter.status.is_some() {
            clauses.push("s.status = ?");
        }

        let search_pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));
        if search_pattern.is_some() {
            clauses.push("(s.invoice_number LIKE ? OR c.name LIKE ?)");
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        (where_sql, search_pattern)
    }
}
