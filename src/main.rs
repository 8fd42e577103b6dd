//! Llama Launcher - profile-driven launcher for llama-server
//!
//! Parses the command line, installs logging, and runs the selected
//! subcommand, exiting with the code of its error class.

use clap::Parser;
use llama_launcher::cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = cli.run() {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
