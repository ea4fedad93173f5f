//! # shiplabel
//!
//! Entry point. Parses arguments, runs the command, prints its JSON on
//! stdout, or the error JSON on stderr with a failing exit code.

use std::process::ExitCode;

use clap::Parser;
use shiplabel_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    shiplabel_cli::init_tracing();

    match shiplabel_cli::run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "Command failed");
            match serde_json::to_string_pretty(&err) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}
