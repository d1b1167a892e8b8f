//! # Document Number Allocation
//!
//! Allocates the next day-scoped invoice/entry number inside the caller's
//! transaction. The pure half (format, counter parsing) lives in
//! [`kasira_core::sequence`]; this module adds the day boundary and the
//! "highest number today" queries.
//!
//! ## Allocation
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  1. day_start = today 00:00 LOCAL, converted to UTC                │
//! │  2. latest   = highest number with this prefix created since then  │
//! │  3. counter  = suffix(latest) + 1, or 1 when none                  │
//! │  4. number   = {PREFIX}-{YYMMDD}-{counter:04}                      │
//! │                                                                    │
//! │  Two concurrent allocations can produce the same number; the       │
//! │  UNIQUE index on the number column turns the loser into a          │
//! │  UniqueViolation that the caller surfaces. No retry here.          │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, LocalResult, NaiveTime, TimeZone, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::LedgerResult;
use crate::repository::{sale, stock_entry};
use kasira_core::sequence::{format_document_number, next_counter};

/// Returns the UTC instant of today's local midnight.
///
/// Document numbering is scoped to the LOCAL calendar day, so the day
/// boundary is computed in local time and converted for the query.
pub fn local_day_start(now: DateTime<Local>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);

    let local = match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Midnight fell into a DST gap; the current instant still bounds
        // today's records from below within the same day.
        LocalResult::None => now,
    };

    local.with_timezone(&Utc)
}

/// Allocates the next invoice number for today.
///
/// Must be called inside the sale coordinator's transaction so the read
/// and the insert share one atomic unit.
pub async fn allocate_invoice_number(
    conn: &mut SqliteConnection,
    prefix: &str,
) -> LedgerResult<String> {
    let now = Local::now();
    let since = local_day_start(now);

    let latest = sale::latest_invoice_number(conn, since, prefix).await?;
    let counter = next_counter(latest.as_deref())?;
    let number = format_document_number(prefix, now.date_naive(), counter);

    debug!(number = %number, "Allocated invoice number");
    Ok(number)
}

/// Allocates the next stock entry number for today.
///
/// Must be called inside the stock entry coordinator's transaction.
pub async fn allocate_entry_number(
    conn: &mut SqliteConnection,
    prefix: &str,
) -> LedgerResult<String> {
    let now = Local::now();
    let since = local_day_start(now);

    let latest = stock_entry::latest_entry_number(conn, since, prefix).await?;
    let counter = next_counter(latest.as_deref())?;
    let number = format_document_number(prefix, now.date_naive(), counter);

    debug!(number = %number, "Allocated entry number");
    Ok(number)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[test]
    fn test_local_day_start_is_before_now() {
        let now = Local::now();
        let start = local_day_start(now);

        assert!(start <= now.with_timezone(&Utc));
        // At most 24h (plus DST slack) behind
        assert!((now.with_timezone(&Utc) - start).num_hours() <= 25);
    }

    #[tokio::test]
    async fn test_first_allocation_starts_at_one() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let number = allocate_invoice_number(&mut conn, "INV").await.unwrap();
        let expected_date = Local::now().date_naive().format("%y%m%d").to_string();
        assert_eq!(number, format!("INV-{expected_date}-0001"));

        let entry = allocate_entry_number(&mut conn, "SE").await.unwrap();
        assert_eq!(entry, format!("SE-{expected_date}-0001"));
    }
}
