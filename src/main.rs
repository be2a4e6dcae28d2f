//! Unbloat: find, verify and remove unreferenced asset directories.
//!
//! Thin binary entry point. All logic lives in the `unbloat-core`
//! and `unbloat-cli` crates.

use clap::Parser;
use std::process::ExitCode;
use unbloat_cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialise structured logging. Logs go to stderr so stdout carries
    // only results.
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Unbloat starting");

    unbloat_cli::run(&cli)
}
