//! # ModaGestão Back-office Library
//!
//! Application layer of the back-office: configuration, state, and one
//! command per operator action. The `moda` binary is a thin CLI over it.
//!
//! ## Module Organization
//! ```text
//! moda_backoffice/
//! ├── lib.rs          ◄─── You are here (bootstrap & tracing)
//! ├── cli.rs          ◄─── `moda` subcommands
//! ├── batch.rs        ◄─── Bounded-concurrency batch writes
//! ├── navigation.rs   ◄─── ViewState, Navigator, Confirmation
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── cart.rs     ◄─── Cart state management
//! │   ├── nav.rs      ◄─── Navigation state
//! │   └── config.rs   ◄─── AppConfig (toml + env)
//! ├── commands/       ◄─── Product, customer, cart, sale, settlement,
//! │                        dashboard, import, backup
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: info,moda=debug,sqlx=warn; RUST_LOG overrides            │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • defaults → moda.toml → MODA_* environment                         │
//! │                                                                         │
//! │  3. Connect to Database ──────────────────────────────────────────────► │
//! │     • SQLite with WAL mode                                              │
//! │     • Run pending migrations                                            │
//! │                                                                         │
//! │  4. Initialize State Objects ─────────────────────────────────────────► │
//! │     • DbState, CartState (empty), NavState (Dashboard)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod cli;
pub mod commands;
pub mod error;
pub mod navigation;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use error::ApiResult;
use state::{AppConfig, CartState, DbState, NavState};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,moda=debug,sqlx=warn";

/// Everything a running back-office holds.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbState,
    pub cart: CartState,
    pub nav: NavState,
}

impl AppState {
    /// Opens the configured database and creates empty session state.
    pub async fn bootstrap(config: AppConfig) -> ApiResult<Self> {
        let db = DbState::open(&config).await?;
        info!(store = %config.store_name, "Back-office ready");
        Ok(AppState::with_db(config, db))
    }

    /// Session state around an already opened database.
    pub fn with_db(config: AppConfig, db: DbState) -> Self {
        AppState {
            config,
            db,
            cart: CartState::new(),
            nav: NavState::new(),
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=moda=trace` - Show trace for moda crates only
/// - Default: [`DEFAULT_LOG_FILTER`]
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second call (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
