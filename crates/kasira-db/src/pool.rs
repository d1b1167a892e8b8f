//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance
//! - Readers don't block writers, writers don't block readers
//! - Better crash recovery

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::coordinator::sale::SaleCoordinator;
use crate::coordinator::stock_entry::StockEntryCoordinator;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::company::CompanyProfileRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::stock_entry::StockEntryRepository;
use crate::repository::variant::VariantRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/kasira.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let config = DbConfig::in_memory();
    /// let db = Database::new(config).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository and coordinator access.
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path?mode=rwc creates the file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has foreign keys disabled by default
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Automatically called by `new()` unless disabled in the config.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// For advanced queries not covered by repositories.
    /// Prefer repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the product variant repository.
    pub fn variants(&self) -> VariantRepository {
        VariantRepository::new(self.pool.clone())
    }

    /// Returns the customer repository.
    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Returns the sale repository (reads and listings).
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the stock entry repository (reads and listings).
    pub fn stock_entries(&self) -> StockEntryRepository {
        StockEntryRepository::new(self.pool.clone())
    }

    /// Returns the activity log repository.
    pub fn activity(&self) -> ActivityLogRepository {
        ActivityLogRepository::new(self.pool.clone())
    }

    /// Returns the company profile repository.
    pub fn company(&self) -> CompanyProfileRepository {
        CompanyProfileRepository::new(self.pool.clone())
    }

    /// Returns the sale transaction coordinator.
    pub fn sale_coordinator(&self) -> SaleCoordinator {
        SaleCoordinator::new(self.pool.clone())
    }

    /// Returns the stock entry transaction coordinator.
    pub fn stock_entry_coordinator(&self) -> StockEntryCoordinator {
        StockEntryCoordinator::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }
}
