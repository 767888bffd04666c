//! # Commands Module
//!
//! One async function per operator action. The CLI and the integration
//! tests call these directly.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs         ◄─── You are here (exports)
//! ├── product.rs     ◄─── Catalog list, search, save, delete
//! ├── customer.rs    ◄─── Customer list, save, delete
//! ├── cart.rs        ◄─── Cart manipulation on the new-sale screen
//! ├── sale.rs        ◄─── Checkout, sale listing, delete
//! ├── settlement.rs  ◄─── Payments against installments
//! ├── dashboard.rs   ◄─── Receivables summary, overdue list, onboarding
//! ├── import.rs      ◄─── Catalog file preview and batch apply
//! └── backup.rs      ◄─── Export, restore, reset
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller (CLI / tests)                                                   │
//! │     │                                                                   │
//! │     │  commands::sale::checkout(&db, &cart, &nav, request)              │
//! │     ▼                                                                   │
//! │  ┌──────────────┐   rules    ┌──────────────┐   storage  ┌───────────┐  │
//! │  │   command    │──────────►│  moda-core   │            │  moda-db  │  │
//! │  │ (this crate) │──────────────────────────────────────►│           │  │
//! │  └──────────────┘                                       └───────────┘  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Result<T, ApiError>  (serializable, plain-language message)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn list_products(db: &DbState) -> ApiResult<Vec<Product>>
//!
//! // Only needs cart
//! fn get_cart(cart: &CartState) -> CartResponse
//!
//! // Needs database, cart and navigation
//! async fn checkout(db: &DbState, cart: &CartState, nav: &NavState, ..)
//! ```
//!
//! Destructive commands take a [`Confirmation`](crate::navigation::Confirmation)
//! and return [`Outcome::Cancelled`](crate::navigation::Outcome) when it
//! is declined.

pub mod backup;
pub mod cart;
pub mod customer;
pub mod dashboard;
pub mod import;
pub mod product;
pub mod sale;
pub mod settlement;
