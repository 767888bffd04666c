//! # State Module
//!
//! Application state for the back-office.
//!
//! Instead of a single `AppState` struct containing everything, there are
//! separate state types and each command takes only the ones it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐  │
//! │  │   DbState    │  │  CartState   │  │  NavState    │  │  AppConfig  │  │
//! │  │              │  │              │  │              │  │             │  │
//! │  │  Database    │  │  Arc<Mutex<  │  │  Arc<Mutex<  │  │  store name │  │
//! │  │  (SQLite     │  │    Cart      │  │   Navigator  │  │  db path    │  │
//! │  │   pool)      │  │  >>          │  │  >>          │  │  import     │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └─────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • DbState: Database has internal connection pool (thread-safe)         │
//! │  • CartState / NavState: Arc<Mutex<T>> for exclusive access             │
//! │  • AppConfig: read-only after startup                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;
mod nav;

pub use cart::CartState;
pub use config::{AppConfig, ConfigError};
pub use db::DbState;
pub use nav::NavState;
