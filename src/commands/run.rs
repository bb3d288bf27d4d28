//! Run command implementation
//!
//! Loads the config file, connects to the data service and runs the update
//! over every selected layer. The exit code reflects the run's error tally.

use anyhow::Result;
use clap::Args;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

use lds_metadata_updater::config;
use lds_metadata_updater::orchestrator::{Orchestrator, RunSettings};
use lds_metadata_updater::output::{OutputConfig, Status};
use lds_metadata_updater::remote::KoordinatesClient;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML config file
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "LDS_METADATA_UPDATER_CONFIG",
        default_value = "config.yaml"
    )]
    pub config: PathBuf,

    /// Edit local copies only; never create drafts or publish
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Write the metadata summary and missing-metadata reports
    #[arg(long)]
    pub summarize: bool,
}

/// Execute the run command
pub fn execute(args: RunArgs, color_flag: &str) -> Result<ExitCode> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let mut config = config::from_file(&args.config)?;
    config.dry_run |= args.dry_run;
    config.summarize |= args.summarize;

    info!(
        "Loaded {} rule(s) from {}",
        config.rules.len(),
        args.config.display()
    );
    if config.dry_run {
        println!("{}", out.line(Status::Info, "DRY RUN: nothing will be published"));
    }

    let client = KoordinatesClient::new(&config.connection.domain, config.connection.api_key.clone())?;
    let outcome = Orchestrator::new(&client, RunSettings::from_config(&config)).run()?;

    for report in &outcome.reports {
        println!("{}", out.line(Status::Info, format!("Report: {}", report.display())));
    }
    println!("{}", out.completion_line(&outcome.tally));

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
