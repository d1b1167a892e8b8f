//! # Activity Log Repository
//!
//! Append-only audit trail of mutating actions.
//!
//! ## Append-Only Discipline
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Entries are written INSIDE the same transaction as the mutation   │
//! │  they describe:                                                    │
//! │                                                                    │
//! │    1. INSERT INTO sales ...                                        │
//! │    2. UPDATE product_variants ... (ledger)                         │
//! │    3. INSERT INTO activity_log ...  ← same transaction             │
//! │    COMMIT                                                          │
//! │                                                                    │
//! │  Either the mutation and its audit entry both exist, or neither    │
//! │  does. Entries are never updated or deleted.                       │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kasira_core::{ActivityAction, ActivityLog};

/// Columns selected for a full activity row.
const ACTIVITY_COLUMNS: &str = "id, user_id, action, entity_type, entity_id, details, created_at";

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Appends an audit entry on the caller's connection.
///
/// ## Arguments
/// * `details` - action-specific JSON payload (invoice number, totals, ...)
pub async fn append(
    conn: &mut SqliteConnection,
    user_id: &str,
    action: ActivityAction,
    entity_type: &str,
    entity_id: &str,
    details: serde_json::Value,
) -> DbResult<()> {
    debug!(
        user_id = %user_id,
        action = %action,
        entity_id = %entity_id,
        "Appending activity entry"
    );

    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO activity_log (
            id, user_id, action, entity_type, entity_id, details, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(action.as_str())
    .bind(entity_type)
    .bind(entity_id)
    .bind(details.to_string())
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reading the activity log.
///
/// There is deliberately no update or delete here.
#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    pool: SqlitePool,
}

impl ActivityLogRepository {
    /// Creates a new ActivityLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ActivityLogRepository { pool }
    }

    /// Lists the most recent entries, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<ActivityLog>> {
        let entries = sqlx::query_as::<_, ActivityLog>(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS} FROM activity_log
            ORDER BY created_at DESC
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Lists entries for one entity, newest first.
    pub async fn for_entity(&self, entity_type: &str, entity_id: &str) -> DbResult<Vec<ActivityLog>> {
        let entries = sqlx::query_as::<_, ActivityLog>(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS} FROM activity_log
            WHERE entity_type = ?1 AND entity_id = ?2
            ORDER BY created_at DESC
            "#
        ))
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Counts all entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_log")
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
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    #[tokio::test]
    async fn test_append_and_read() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        append(
            &mut conn,
            "user-1",
            ActivityAction::CreateSale,
            "Sale",
            "sale-1",
            json!({ "invoiceNumber": "INV-260807-0001", "totalCents": 10000 }),
        )
        .await
        .unwrap();
        drop(conn);

        let entries = db.activity().recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "CREATE_SALE");
        assert_eq!(entries[0].entity_type, "Sale");

        let details: serde_json::Value =
            serde_json::from_str(entries[0].details.as_deref().unwrap()).unwrap();
        assert_eq!(details["totalCents"], 10000);

        let for_sale = db.activity().for_entity("Sale", "sale-1").await.unwrap();
        assert_eq!(for_sale.len(), 1);
        assert_eq!(db.activity().count().await.unwrap(), 1);
    }
}
