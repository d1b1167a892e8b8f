//! # kasira-db: Database Layer for Kasira
//!
//! This crate provides database access and the transactional ledger
//! operations for the Kasira inventory/point-of-sale system. It uses
//! SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                        Kasira Data Flow                            │
//! │                                                                    │
//! │  Caller (web/API layer, out of scope)                              │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  ┌──────────────────────────────────────────────────────────────┐  │
//! │  │                   kasira-db (THIS CRATE)                     │  │
//! │  │                                                              │  │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌───────────────────┐    │  │
//! │  │  │  Database  │  │ Repositories │  │   Coordinators    │    │  │
//! │  │  │ (pool.rs)  │  │ variant/sale │  │ sale, stock_entry │    │  │
//! │  │  │            │◄─│ customer/... │◄─│ one transaction   │    │  │
//! │  │  │ SqlitePool │  │              │  │ per operation     │    │  │
//! │  │  └────────────┘  └──────────────┘  └─────────┬─────────┘    │  │
//! │  │         ▲                                    │              │  │
//! │  │         │        ┌──────────────┐            │              │  │
//! │  │         └────────│ Stock Ledger │◄───────────┘              │  │
//! │  │                  │ (ledger.rs)  │  sole stock mutator       │  │
//! │  │                  └──────────────┘                           │  │
//! │  └──────────────────────────────────────────────────────────────┘  │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  SQLite Database (WAL mode, foreign keys on)                       │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and coordinator error types
//! - [`ledger`] - Stock ledger (sole mutator of on-hand quantities)
//! - [`sequence`] - Day-scoped document number allocation
//! - [`repository`] - Repository implementations per table
//! - [`coordinator`] - Sale and stock entry transaction coordinators
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasira_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kasira.db")).await?;
//!
//! // Reads go through repositories
//! let low = db.variants().list_low_stock(20).await?;
//!
//! // Mutations go through coordinators, one transaction each
//! let created = db.sale_coordinator().create_sale(user_id, input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sequence;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use pool::{Database, DbConfig};

// Coordinator re-exports for convenience
pub use coordinator::sale::{CreateSaleInput, CreatedSale, CustomerSelector, SaleCoordinator};
pub use coordinator::stock_entry::{
    CreateStockEntryInput, CreatedStockEntry, StockEntryCoordinator, StockEntryLineInput,
};

// Repository re-exports for convenience
pub use repository::activity::ActivityLogRepository;
pub use repository::company::CompanyProfileRepository;
pub use repository::customer::CustomerRepository;
pub use repository::sale::{SaleFilter, SalePage, SaleRepository};
pub use repository::stock_entry::{StockEntryFilter, StockEntryPage, StockEntryRepository};
pub use repository::variant::{NewVariant, VariantRepository};
