//! # moda-core: Pure Ledger Logic for ModaGestão
//!
//! This crate is the **heart** of the back-office. It contains the
//! installment-sale ledger and its settlement/reconciliation rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ModaGestão Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  backoffice (commands)                          │   │
//! │  │   checkout, record_payment, import_catalog, dashboard, backup   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ moda-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌─────────────┐ ┌────────────┐ ┌──────────────┐  │   │
//! │  │  │  money   │ │ installment │ │ settlement │ │    ledger    │  │   │
//! │  │  │  Money   │ │  generate   │ │ record_pay │ │   summary    │  │   │
//! │  │  └──────────┘ └─────────────┘ └────────────┘ └──────────────┘  │   │
//! │  │  ┌──────────┐ ┌─────────────┐ ┌────────────┐ ┌──────────────┐  │   │
//! │  │  │   sale   │ │  reconcile  │ │   import   │ │    backup    │  │   │
//! │  │  │  create  │ │ add/update  │ │ row mapper │ │   document   │  │   │
//! │  │  └──────────┘ └─────────────┘ └────────────┘ └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    moda-db (Database Layer)                     │   │
//! │  │          SQLite documents, checkout transaction, feeds          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and settlement tolerances
//! - [`types`] - Domain types (Product, Customer, Sale, Installment)
//! - [`installment`] - Splits a sale total into a monthly schedule
//! - [`settlement`] - Records payments against one installment
//! - [`sale`] - Builds the sale aggregate at checkout
//! - [`cart`] - Snapshot cart lines for checkout
//! - [`ledger`] - Dashboard metrics and overdue listing
//! - [`reconcile`] - Catalog upsert planning keyed by SKU
//! - [`import`] - Tabular catalog row mapping
//! - [`backup`] - Backup document schema and signature check
//! - [`integrity`] - Audit of stored paid flags and schedule sums
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: "today" and "now" are always parameters
//! 2. **Integer Money**: All monetary values are in cents (i64)
//! 3. **Derived Status**: an installment's paid flag is computed, never stored
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use moda_core::installment::generate;
//! use moda_core::money::Money;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let schedule = generate(Money::from_cents(10_000), 3, start).unwrap();
//!
//! // Remainder cent lands on the last installment
//! assert_eq!(schedule[0].value.cents(), 3333);
//! assert_eq!(schedule[2].value.cents(), 3334);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod cart;
pub mod error;
pub mod import;
pub mod installment;
pub mod integrity;
pub mod ledger;
pub mod money;
pub mod reconcile;
pub mod sale;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of installments a sale can be split into.
///
/// ## Business Reason
/// The checkout form offers up to 24 monthly installments.
pub const MAX_INSTALLMENTS: u32 = 24;

/// Maximum quantity of a single item in a cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum distinct lines in a cart.
pub const MAX_CART_ITEMS: usize = 100;
