//! # Company Profile Repository
//!
//! Singleton company settings row. The coordinators read the document
//! number prefixes from here inside their transactions; when no profile
//! has been saved yet the defaults apply.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kasira_core::CompanyProfile;

/// Default invoice number prefix when no profile is saved.
pub const DEFAULT_INVOICE_PREFIX: &str = "INV";

/// Default stock entry number prefix when no profile is saved.
pub const DEFAULT_STOCK_ENTRY_PREFIX: &str = "SE";

/// Columns selected for a full profile row.
const PROFILE_COLUMNS: &str =
    "id, name, address, phone, invoice_prefix, stock_entry_prefix, updated_at";

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Fetches the profile on the caller's connection.
pub async fn fetch(conn: &mut SqliteConnection) -> DbResult<Option<CompanyProfile>> {
    let profile = sqlx::query_as::<_, CompanyProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM company_profile LIMIT 1"
    ))
    .fetch_optional(conn)
    .await?;

    Ok(profile)
}

/// Returns the invoice prefix, falling back to the default.
pub async fn invoice_prefix(conn: &mut SqliteConnection) -> DbResult<String> {
    Ok(fetch(conn)
        .await?
        .map(|p| p.invoice_prefix)
        .unwrap_or_else(|| DEFAULT_INVOICE_PREFIX.to_string()))
}

/// Returns the stock entry prefix, falling back to the default.
pub async fn stock_entry_prefix(conn: &mut SqliteConnection) -> DbResult<String> {
    Ok(fetch(conn)
        .await?
        .map(|p| p.stock_entry_prefix)
        .unwrap_or_else(|| DEFAULT_STOCK_ENTRY_PREFIX.to_string()))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the company profile.
#[derive(Debug, Clone)]
pub struct CompanyProfileRepository {
    pool: SqlitePool,
}

impl CompanyProfileRepository {
    /// Creates a new CompanyProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyProfileRepository { pool }
    }

    /// Gets the profile, if one has been saved.
    pub async fn get(&self) -> DbResult<Option<CompanyProfile>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn).await
    }

    /// Saves the profile, replacing any existing row.
    ///
    /// The profile is a singleton: the first save creates it, later saves
    /// update it in place.
    pub async fn save(
        &self,
        name: &str,
        address: Option<&str>,
        phone: Option<&str>,
        invoice_prefix: &str,
        stock_entry_prefix: &str,
    ) -> DbResult<CompanyProfile> {
        debug!(name = %name, "Saving company profile");

        let now = Utc::now();
        let existing = self.get().await?;
        let id = existing
            .map(|p| p.id)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let profile = CompanyProfile {
            id: id.clone(),
            name: name.trim().to_string(),
            address: address.map(|a| a.trim().to_string()),
            phone: phone.map(|p| p.trim().to_string()),
            invoice_prefix: invoice_prefix.trim().to_string(),
            stock_entry_prefix: stock_entry_prefix.trim().to_string(),
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO company_profile (
                id, name, address, phone, invoice_prefix, stock_entry_prefix, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                phone = excluded.phone,
                invoice_prefix = excluded.invoice_prefix,
                stock_entry_prefix = excluded.stock_entry_prefix,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile.address)
        .bind(&profile.phone)
        .bind(&profile.invoice_prefix)
        .bind(&profile.stock_entry_prefix)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(profile)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_prefixes_default_without_profile() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert_eq!(invoice_prefix(&mut conn).await.unwrap(), "INV");
        assert_eq!(stock_entry_prefix(&mut conn).await.unwrap(), "SE");
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.company()
            .save("Toko Kasira", Some("Jl. Merdeka 1"), None, "KSR", "IN")
            .await
            .unwrap();

        let profile = db.company().get().await.unwrap().unwrap();
        assert_eq!(profile.name, "Toko Kasira");
        assert_eq!(profile.invoice_prefix, "KSR");

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(invoice_prefix(&mut conn).await.unwrap(), "KSR");
        assert_eq!(stock_entry_prefix(&mut conn).await.unwrap(), "IN");
    }

    #[tokio::test]
    async fn test_save_is_singleton() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let first = db.company().save("A", None, None, "INV", "SE").await.unwrap();
        let second = db.company().save("B", None, None, "INV", "SE").await.unwrap();

        assert_eq!(first.id, second.id);
        let profile = db.company().get().await.unwrap().unwrap();
        assert_eq!(profile.name, "B");
    }
}
