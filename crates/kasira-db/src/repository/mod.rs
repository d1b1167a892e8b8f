//! # Repository Module
//!
//! Database repository implementations for Kasira.
//!
//! ## Repository Pattern
//! Each table gets a repository struct holding the pool for reads and
//! listings. Writes that must participate in a coordinator transaction are
//! free functions taking `&mut SqliteConnection`, so they can only run on a
//! connection the caller controls.
//!
//! ## Available Repositories
//!
//! - [`variant::VariantRepository`] - catalog CRUD and low-stock listing
//! - [`customer::CustomerRepository`] - customer CRUD and search
//! - [`sale::SaleRepository`] - sale reads, listings, details
//! - [`stock_entry::StockEntryRepository`] - stock entry reads and listings
//! - [`activity::ActivityLogRepository`] - append-only audit trail reads
//! - [`company::CompanyProfileRepository`] - singleton settings row

pub mod activity;
pub mod company;
pub mod customer;
pub mod sale;
pub mod stock_entry;
pub mod variant;
