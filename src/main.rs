//! Profilebot - A Slack bot which validates the profiles of your team's
//! users. It takes its commands from direct messages.

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod config;
mod bot;
mod error;
mod face;
mod heartbeat;
mod logging;
mod profile;
mod slack;
mod storage;

use cli::Commands;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging. The guard keeps the non-blocking file writer
    // alive until the process exits.
    let _logging_guard = match logging::init() {
        Ok((guard, _)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Parse command line arguments
    let args = Commands::parse();

    // Run the command
    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error, Profilebot going down.");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
