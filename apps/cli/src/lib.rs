//! # Shiplabel CLI Library
//!
//! Command-line front end for the shipping label wizard core.
//!
//! ## Module Organization
//! ```text
//! shiplabel_cli/
//! ├── lib.rs           ◄─── You are here (logging, dispatch)
//! ├── cli.rs           ◄─── clap argument definitions
//! ├── state/
//! │   ├── config.rs    ◄─── SHIPLABEL_* settings
//! │   ├── locations.rs ◄─── Country catalog + feature flags
//! │   ├── form.rs      ◄─── Form snapshot + derivation cache
//! │   └── db.rs        ◄─── Database wrapper
//! ├── commands/
//! │   ├── form.rs      ◄─── evaluate
//! │   ├── countries.rs ◄─── countries
//! │   └── labels.rs    ◄─── labels list / import / clear
//! └── error.rs         ◄─── ApiError printed on failure
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::labels::LabelsCommand;
use error::ApiError;
use state::{ConfigState, DbState, FormStoreState, LocationsState};

/// Runs one command and returns its JSON output.
///
/// ## Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. ConfigState::from_env()                                             │
/// │  2. evaluate / countries: LocationsState::load (catalog + flags)        │
/// │     labels:               DbState::open (SQLite + migrations)           │
/// │  3. Run the command                                                     │
/// │  4. Pretty-print the result as JSON                                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> Result<String, ApiError> {
    let config = ConfigState::from_env();

    match cli.command {
        Commands::Evaluate(args) => {
            let locations = LocationsState::load(&config)?;
            let store = FormStoreState::new();
            let report = commands::form::evaluate(&args, &store, &locations, &config).await?;
            to_json(&report)
        }
        Commands::Countries => {
            let locations = LocationsState::load(&config)?;
            to_json(&commands::countries::list_countries(&locations))
        }
        Commands::Labels(args) => {
            let db = DbState::open(&config).await?;
            let output = run_labels(&db, &config, args.command).await;
            db.close().await;
            output
        }
    }
}

async fn run_labels(
    db: &DbState,
    config: &ConfigState,
    command: LabelsCommand,
) -> Result<String, ApiError> {
    match command {
        LabelsCommand::List { order_id } => {
            to_json(&commands::labels::list_labels(db, config, order_id).await?)
        }
        LabelsCommand::Import {
            order_id,
            file,
            replace,
        } => to_json(&commands::labels::import_labels(db, order_id, &file, replace).await?),
        LabelsCommand::Clear { order_id } => {
            to_json(&commands::labels::clear_labels(db, order_id).await?)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays
/// clean JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=shiplabel=trace` - Show trace for shiplabel crates only
/// - Default: INFO, with debug for shiplabel crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shiplabel=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "shiplabel starting");
}
