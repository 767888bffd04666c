//! # `moda` Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        moda (this binary)                               │
//! │                                                                         │
//! │  main.rs ────► logging, clap parse                                      │
//! │  cli.rs ─────► parse subcommand, load config, open database             │
//! │  commands/ ──► checkout, record_payment, preview_import, restore ...    │
//! │  state/ ─────► DbState, CartState, NavState, AppConfig                  │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  SQLite database (platform data dir)/moda.db                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;
use moda_backoffice::cli::{self, Cli};
use moda_backoffice::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            ExitCode::FAILURE
        }
    }
}
