//! # Repository Module
//!
//! Database repository implementations for ModaGestão.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Backoffice command                                                     │
//! │       │                                                                 │
//! │       │  db.sales().record_payment(sale_id, installment_id, amount)     │
//! │       ▼                                                                 │
//! │  SaleRepository                                                         │
//! │  ├── list / get / get_versioned                                         │
//! │  ├── checkout        (stock + document, one transaction)                │
//! │  ├── update_with     (version-checked)                                  │
//! │  └── delete                                                             │
//! │       │                                                                 │
//! │       │  SQL + ChangeFeed::notify on commit                             │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, SKU lookup
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer CRUD
//! - [`SaleRepository`](sale::SaleRepository) - Checkout and settlement
//! - [`WorkspaceRepository`](workspace::WorkspaceRepository) - Restore and reset

pub mod customer;
pub mod product;
pub mod sale;
pub mod workspace;
