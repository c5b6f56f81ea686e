//! # Stockroom CLI Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Parse the command line
//! 3. Load configuration from `STOCKROOM_*` variables
//! 4. Connect to the database & run migrations
//! 5. Run the command, render JSON or an error line
//!
//! The actual setup is in lib.rs for testability.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    stockroom_admin::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    stockroom_admin::run(&args).await
}
