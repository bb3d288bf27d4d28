//! # LDS Metadata Updater CLI
//!
//! This is the binary entry point for the `lds-metadata-updater` command-line
//! tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging.
//! - Turning the run's error tally into the process exit code.
//!
//! The update logic itself lives in the `lds_metadata_updater` library crate;
//! the binary is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    cli.execute()
}
