//! # Command Line
//!
//! Argument definitions for the `shiplabel` binary.

use clap::Parser;

use crate::commands::form::EvaluateArgs;
use crate::commands::labels::LabelsArgs;

/// Shipping label wizard: form validation, pricing, and stored labels.
///
/// Settings come from `SHIPLABEL_*` environment variables; logs go to
/// stderr and are filtered with `RUST_LOG`.
#[derive(Parser, Debug)]
#[command(name = "shiplabel", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Validate a form snapshot and price its selected rates.
    Evaluate(EvaluateArgs),
    /// List the countries a label may ship from and to.
    Countries,
    /// Inspect and maintain labels stored on orders.
    Labels(LabelsArgs),
}
