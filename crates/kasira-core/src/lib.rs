//! # kasira-core: Pure Business Logic for Kasira
//!
//! This crate is the **heart** of Kasira. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                       Kasira Architecture                          │
//! │                                                                    │
//! │  ┌──────────────────────────────────────────────────────────────┐ │
//! │  │                 Caller (web/API layer, out of scope)         │ │
//! │  └──────────────────────────────┬───────────────────────────────┘ │
//! │                                 │                                  │
//! │  ┌──────────────────────────────▼───────────────────────────────┐ │
//! │  │              ★ kasira-core (THIS CRATE) ★                    │ │
//! │  │                                                              │ │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐          │ │
//! │  │  │  types  │ │  money  │ │ pricing  │ │ sequence │          │ │
//! │  │  │ Variant │ │  Money  │ │ line &   │ │ document │          │ │
//! │  │  │  Sale   │ │ integer │ │ totals   │ │ numbers  │          │ │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └──────────┘          │ │
//! │  │                                                              │ │
//! │  │  NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS            │ │
//! │  └──────────────────────────────┬───────────────────────────────┘ │
//! │                                 │                                  │
//! │  ┌──────────────────────────────▼───────────────────────────────┐ │
//! │  │              kasira-db (Database Layer)                      │ │
//! │  │  SQLite repositories, stock ledger, coordinators             │ │
//! │  └──────────────────────────────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ProductVariant, Sale, StockEntry, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Line and sale total computation, frozen at creation
//! - [`sequence`] - Day-scoped document number formatting and parsing
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input,
//!    same output (dates are parameters, never read from a clock)
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod sequence;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kasira_core::Money` instead of
// `use kasira_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single sale or stock entry.
///
/// Prevents runaway documents and keeps transactions short.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
