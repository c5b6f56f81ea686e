//! # Stockroom Admin Library
//!
//! The `stockroom` command line: operator front end for the catalog, orders
//! and daily reports.
//!
//! ## Module Organization
//! ```text
//! stockroom_admin/
//! ├── lib.rs          ◄─── You are here (tracing setup & run)
//! ├── cli.rs          ◄─── argv → Command
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState (Database + AppConfig)
//! │   └── config.rs   ◄─── STOCKROOM_* environment
//! ├── commands/
//! │   ├── mod.rs      ◄─── dispatch
//! │   ├── category.rs
//! │   ├── product.rs
//! │   ├── order.rs
//! │   ├── report.rs
//! │   └── expense.rs
//! └── error.rs        ◄─── ApiError { code, message }
//! ```
//!
//! ## Output Contract
//! ```text
//! success  → pretty JSON on stdout, exit 0
//! failure  → "error [CODE]: message" on stderr, exit 1
//! stale    → "error [REPORT_STALE]: ..." on stderr, exit 3
//!            (the change itself was committed)
//! usage    → "error [USAGE]: ..." plus help on stderr, exit 2
//! logs     → stderr, filtered by RUST_LOG
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use anyhow::Context;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Command, USAGE};
use error::ApiError;
use state::{AppConfig, AppState};

/// Runs one CLI invocation.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Parse Command ───────── bad syntax: usage on stderr, exit 2        │
/// │  2. Load AppConfig ──────── malformed STOCKROOM_*: anyhow error        │
/// │  3. Open Database ───────── SQLite (WAL), pending migrations applied   │
/// │  4. Dispatch ────────────── commands::dispatch → JSON | ApiError       │
/// │  5. Close pool, render                                                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Only startup failures surface as `Err`; command failures are rendered
/// and mapped to an exit code.
pub async fn run<S: AsRef<str>>(args: &[S]) -> anyhow::Result<ExitCode> {
    let command = match Command::parse(args) {
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return Ok(ExitCode::SUCCESS);
        }
        Ok(command) => command,
        Err(e) => {
            eprintln!("error [USAGE]: {}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            return Ok(ExitCode::from(2));
        }
    };
    debug!(?command, "Parsed command");

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(store = %config.store_name, "Starting Stockroom");

    let state = AppState::open(config)
        .await
        .context("could not open the database")?;

    let outcome = commands::dispatch(&state, command).await;
    state.close().await;

    render(outcome)
}

fn render(outcome: Result<serde_json::Value, ApiError>) -> anyhow::Result<ExitCode> {
    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", err);
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays
/// pure JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockroom_db=trace` - Trace the storage layer only
/// - Default: `info,stockroom=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
