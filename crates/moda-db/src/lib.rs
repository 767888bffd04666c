//! # moda-db: Database Layer for ModaGestão
//!
//! SQLite storage for the catalog, the customer list and the sale ledger,
//! using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ModaGestão Data Flow                             │
//! │                                                                         │
//! │  Backoffice command (checkout, record_payment, import, restore)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     moda-db (THIS CRATE)                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │    │    │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_initial  │    │    │
//! │  │   │ ChangeFeed    │    │ CustomerRepo  │    │              │    │    │
//! │  │   │               │    │ SaleRepo      │    │              │    │    │
//! │  │   │               │    │ WorkspaceRepo │    │              │    │    │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘    │    │
//! │  │           │ subscribe(Collection)                               │    │
//! │  │           ▼                                                     │    │
//! │  │   Subscription → full ordered snapshots                         │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir)/moda.db                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`feed`] - Change notifications and live subscriptions
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use moda_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/moda.db")).await?;
//!
//! db.sales().checkout(&sale).await?;
//! db.sales().record_payment(&sale.id, &installment_id, amount).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod feed;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use feed::{ChangeFeed, Collection, Snapshot, Subscription};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::workspace::{WorkspaceCounts, WorkspaceRepository};
