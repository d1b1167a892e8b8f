//! # Customer Repository
//!
//! Database operations for customers.
//!
//! The sale coordinator resolves-or-creates a customer inside its
//! transaction via the connection-scoped functions here.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasira_core::Customer;

/// Columns selected for a full customer row.
const CUSTOMER_COLUMNS: &str = "id, name, phone, address, created_at, updated_at";

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Fetches a customer on the caller's connection.
pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(customer)
}

/// Inserts a customer on the caller's connection.
///
/// Used by the sale coordinator when a sale names a new customer; the
/// customer row commits or rolls back with the sale.
pub async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    phone: Option<&str>,
    address: Option<&str>,
) -> DbResult<Customer> {
    debug!(name = %name, "Inserting customer");

    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        phone: phone.map(|p| p.trim().to_string()),
        address: address.map(|a| a.trim().to_string()),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO customers (id, name, phone, address, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(conn)
    .await?;

    Ok(customer)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Creates a customer outside of any sale.
    pub async fn create(
        &self,
        name: &str,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, name, phone, address).await
    }

    /// Updates a customer's contact details.
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> DbResult<()> {
        debug!(id = %id, "Updating customer");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                address = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(phone)
        .bind(address)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Searches customers by name or phone substring (for autocomplete).
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS} FROM customers
            WHERE name LIKE ?1 OR phone LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
