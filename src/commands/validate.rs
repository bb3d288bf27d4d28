//! # Validate Command Implementation
//!
//! Loads a config file and reports what a run would do with it: which rules
//! would be applied, in what mode, to which layers. Nothing is downloaded and
//! the data service is never contacted.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;

use lds_metadata_updater::config::{self, Config, DatasetSelector};
use lds_metadata_updater::output::{OutputConfig, Status};

/// Check a config file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the YAML config file to validate
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "LDS_METADATA_UPDATER_CONFIG",
        default_value = "config.yaml"
    )]
    pub config: PathBuf,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<ExitCode> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!(
        "{}",
        out.line(Status::Info, format!("Validating configuration: {}", args.config.display()))
    );

    let config = match config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            println!("{}", out.line(Status::Fail, &e));
            return Err(anyhow::anyhow!("Configuration is invalid: {}", e));
        }
    };

    for line in describe(&config) {
        println!("   {}", line);
    }
    if config.rules.is_empty() {
        println!(
            "{}",
            out.line(Status::Warn, "No substitution rules; the run will only summarize metadata")
        );
    }
    println!("{}", out.line(Status::Ok, "Configuration is valid"));
    Ok(ExitCode::SUCCESS)
}

/// Human-readable summary of a loaded config
fn describe(config: &Config) -> Vec<String> {
    let mut lines = vec![
        format!("Domain: {}", config.connection.domain),
        format!("Output directory: {}", config.destination_dir.display()),
        match &config.datasets {
            DatasetSelector::All => "Datasets: all layers and tables".to_string(),
            DatasetSelector::Explicit(ids) => format!(
                "Datasets: {} ({})",
                ids.len(),
                ids.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
            ),
        },
        format!(
            "Dry run: {} | Overwrite files: {} | Summarize: {}",
            config.dry_run, config.overwrite_files, config.summarize
        ),
        format!("Rules: {}", config.rules.len()),
    ];

    for (index, rule) in config.rules.iter().enumerate() {
        let scope = match &rule.target_element {
            Some(path) => format!("in {}", path),
            None => "whole file".to_string(),
        };
        lines.push(format!(
            "  {}. '{}' -> '{}' ({}{})",
            index + 1,
            rule.search,
            rule.replace,
            scope,
            if rule.ignore_case { ", ignore case" } else { "" }
        ));
    }
    lines
}
