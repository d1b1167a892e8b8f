//! # Stock Entry Repository
//!
//! Reads and listings for incoming-stock entries, plus the
//! connection-scoped writes used by the stock entry coordinator.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kasira_core::{EntryStatus, StockEntry, StockEntryItem};

/// Columns selected for a full stock entry row.
const ENTRY_COLUMNS: &str = r#"
    id, entry_number, recorded_by_id, status, notes,
    cancel_reason, cancelled_at, created_at, updated_at
"#;

/// Columns selected for a full stock entry item row.
const ENTRY_ITEM_COLUMNS: &str = r#"
    id, stock_entry_id, variant_id, quantity, cost_price_cents, created_at
"#;

// =============================================================================
// Listing Types
// =============================================================================

/// Filters for listing stock entries.
#[derive(Debug, Clone, Default)]
pub struct StockEntryFilter {
    /// Inclusive lower bound on creation time.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub end: Option<DateTime<Utc>>,
    pub status: Option<EntryStatus>,
    /// Substring match on entry number.
    pub search: Option<String>,
    /// 1-based page number; 0 is treated as 1.
    pub page: u32,
}

/// One page of stock entries plus pagination data.
#[derive(Debug, Clone)]
pub struct StockEntryPage {
    pub entries: Vec<StockEntry>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}

/// A stock entry with its items resolved.
#[derive(Debug, Clone)]
pub struct StockEntryDetails {
    pub entry: StockEntry,
    pub items: Vec<StockEntryItem>,
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Fetches a stock entry on the caller's connection.
pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<StockEntry>> {
    let entry = sqlx::query_as::<_, StockEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM stock_entries WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(entry)
}

/// Fetches a stock entry's items on the caller's connection.
pub async fn fetch_items(
    conn: &mut SqliteConnection,
    stock_entry_id: &str,
) -> DbResult<Vec<StockEntryItem>> {
    let items = sqlx::query_as::<_, StockEntryItem>(&format!(
        r#"
        SELECT {ENTRY_ITEM_COLUMNS} FROM stock_entry_items
        WHERE stock_entry_id = ?1
        ORDER BY created_at, id
        "#
    ))
    .bind(stock_entry_id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

/// Returns today's highest entry number for the given prefix, if any.
///
/// Scoped by (day, prefix) like the invoice counterpart.
pub async fn latest_entry_number(
    conn: &mut SqliteConnection,
    since: DateTime<Utc>,
    prefix: &str,
) -> DbResult<Option<String>> {
    let pattern = format!("{prefix}-%");

    let number: Option<String> = sqlx::query_scalar(
        r#"
        SELECT entry_number FROM stock_entries
        WHERE created_at >= ?1 AND entry_number LIKE ?2
        ORDER BY entry_number DESC
        LIMIT 1
        "#,
    )
    .bind(since)
    .bind(pattern)
    .fetch_optional(conn)
    .await?;

    Ok(number)
}

/// Inserts a stock entry row on the caller's connection.
pub async fn insert_entry(conn: &mut SqliteConnection, entry: &StockEntry) -> DbResult<()> {
    debug!(id = %entry.id, entry_number = %entry.entry_number, "Inserting stock entry");

    sqlx::query(
        r#"
        INSERT INTO stock_entries (
            id, entry_number, recorded_by_id, status, notes,
            cancel_reason, cancelled_at, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.entry_number)
    .bind(&entry.recorded_by_id)
    .bind(entry.status)
    .bind(&entry.notes)
    .bind(&entry.cancel_reason)
    .bind(entry.cancelled_at)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts a stock entry item row on the caller's connection.
pub async fn insert_item(conn: &mut SqliteConnection, item: &StockEntryItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_entry_items (
            id, stock_entry_id, variant_id, quantity, cost_price_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&item.id)
    .bind(&item.stock_entry_id)
    .bind(&item.variant_id)
    .bind(item.quantity)
    .bind(item.cost_price_cents)
    .bind(item.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Marks a COMPLETED stock entry as cancelled.
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
) -> DbResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE stock_entries SET
            status = 'CANCELLED',
            cancel_reason = ?2,
            cancelled_at = ?3,
            updated_at = ?3
        WHERE id = ?1 AND status = 'COMPLETED'
        "#,
    )
    .bind(id)
    .bind(reason)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock entry reads and listings.
///
/// All writes happen through
/// [`crate::coordinator::stock_entry::StockEntryCoordinator`].
#[derive(Debug, Clone)]
pub struct StockEntryRepository {
    pool: SqlitePool,
}

impl StockEntryRepository {
    /// Creates a new StockEntryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockEntryRepository { pool }
    }

    /// Gets a stock entry by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockEntry>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Gets all items for a stock entry.
    pub async fn get_items(&self, stock_entry_id: &str) -> DbResult<Vec<StockEntryItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, stock_entry_id).await
    }

    /// Gets a stock entry with its items.
    pub async fn get_details(&self, id: &str) -> DbResult<Option<StockEntryDetails>> {
        let mut conn = self.pool.acquire().await?;

        let entry = match fetch_by_id(&mut conn, id).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let items = fetch_items(&mut conn, id).await?;

        Ok(Some(StockEntryDetails { entry, items }))
    }

    /// Lists stock entries matching the filter, newest first, paginated.
    pub async fn list(&self, filter: &StockEntryFilter) -> DbResult<StockEntryPage> {
        let page_size = super::sale::PAGE_SIZE;
        let page = filter.page.max(1);
        let offset = (page - 1) * page_size;

        let mut clauses: Vec<&str> = Vec::new();
        if filter.start.is_some() {
            clauses.push("created_at >= ?");
        }
        if filter.end.is_some() {
            clauses.push("created_at <= ?");
        }
        if filter.status.is_some() {
            clauses.push("status = ?");
        }
        let search_pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));
        if search_pattern.is_some() {
            clauses.push("entry_number LIKE ?");
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let list_sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM stock_entries
            {where_sql}
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#
        );
        let count_sql = format!("SELECT COUNT(*) FROM stock_entries {where_sql}");

        let mut list_query = sqlx::query_as::<_, StockEntry>(&list_sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);

        if let Some(start) = filter.start {
            list_query = list_query.bind(start);
            count_query = count_query.bind(start);
        }
        if let Some(end) = filter.end {
            list_query = list_query.bind(end);
            count_query = count_query.bind(end);
        }
        if let Some(status) = filter.status {
            list_query = list_query.bind(status);
            count_query = count_query.bind(status);
        }
        if let Some(pattern) = &search_pattern {
            list_query = list_query.bind(pattern);
            count_query = count_query.bind(pattern);
        }

        let entries = list_query
            .bind(page_size)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total = count_query.fetch_one(&self.pool).await?;

        Ok(StockEntryPage {
            entries,
            page,
            page_size,
            total,
            total_pages: (total + page_size as i64 - 1) / page_size as i64,
        })
    }
}
