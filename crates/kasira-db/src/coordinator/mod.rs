//! # Transaction Coordinators
//!
//! Multi-step atomic operations spanning several entities.
//!
//! ## Coordinator Pattern
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Every operation is ONE database transaction:                      │
//! │                                                                    │
//! │    validate input            (no I/O)                              │
//! │    pre-flight reads          (friendly errors, pool connection)    │
//! │    BEGIN                                                           │
//! │      resolve collaborators   (customer, number prefix)             │
//! │      allocate document number                                      │
//! │      insert record + items                                         │
//! │      move stock via the ledger (guarded)                           │
//! │      append audit entry                                            │
//! │    COMMIT                                                          │
//! │                                                                    │
//! │  Any error inside the block drops the transaction and rolls the   │
//! │  whole phase back: record, items, stock, and audit entry together. │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Coordinators
//!
//! - [`sale::SaleCoordinator`] - sale creation and cancellation
//! - [`stock_entry::StockEntryCoordinator`] - stock-in creation and
//!   cancellation

pub mod sale;
pub mod stock_entry;
