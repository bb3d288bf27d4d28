//! End-to-end tests for CLI exit codes.
//!
//! - Exit code 0: Success (valid config, or a run with no errors)
//! - Exit code 1: Fatal configuration error, or a run that recorded errors
//! - Exit code 2: Invalid command-line usage (handled by clap)

mod common;
use common::prelude::*;

/// Exit code 0 is returned for a valid configuration.
#[test]
fn test_exit_code_success() {
    let fixture = TestFixture::new().with_config(configs::MINIMAL);

    fixture.command("validate").assert().code(0);
}

/// Exit code 0 is returned for --help.
#[test]
fn test_exit_code_help() {
    let mut cmd = cargo_bin_cmd!("lds-metadata-updater");

    cmd.arg("--help").assert().code(0);
}

/// Exit code 0 is returned for --version.
#[test]
fn test_exit_code_version() {
    let mut cmd = cargo_bin_cmd!("lds-metadata-updater");

    cmd.arg("--version")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Exit code 1 is returned when the config file does not exist.
#[test]
fn test_exit_code_error_config_not_found() {
    let fixture = TestFixture::new();

    fixture
        .command("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Can not read config file"));
}

/// Exit code 1 is returned for invalid YAML syntax.
#[test]
fn test_exit_code_error_invalid_yaml() {
    let fixture = TestFixture::new().with_config(configs::INVALID_YAML);

    fixture
        .command("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration file"));
}

/// A missing API key is a fatal configuration error before any layer work.
#[test]
fn test_exit_code_error_missing_api_key() {
    let fixture = TestFixture::new().with_config(configs::NO_API_KEY);

    fixture
        .command("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No LDS API key provided"))
        .stdout(predicate::str::contains("COMPLETE").not());
}

/// The LDS_APIKEY environment variable supplies a missing key.
#[test]
fn test_api_key_from_environment() {
    let fixture = TestFixture::new().with_config(configs::NO_API_KEY);

    fixture
        .command("validate")
        .env("LDS_APIKEY", "from-env")
        .assert()
        .code(0);
}

/// Exit code 2 is returned for an unknown subcommand.
#[test]
fn test_exit_code_usage_error() {
    let mut cmd = cargo_bin_cmd!("lds-metadata-updater");

    cmd.arg("publish-everything").assert().code(2);
}

/// A run whose layers all fail still completes, then exits 1 with the
/// error count.
#[test]
fn test_exit_code_run_with_layer_errors() {
    let fixture = TestFixture::new().with_config(configs::MINIMAL);

    fixture
        .command("run")
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Process failed with 1 error(s). Please see log for critical messages",
        ))
        .stderr(predicate::str::contains("Failed to fetch layer 50285"));
}

/// When the catalog cannot be listed no layers are processed and the run
/// reports one error. Summarize still writes (empty) reports.
#[test]
fn test_exit_code_catalog_failure() {
    let fixture = TestFixture::new().with_config(configs::SUMMARIZE_ONLY);

    fixture
        .command("run")
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Process failed with 1 error(s)"));

    fixture.child("metadata_summary.csv").assert(predicate::path::exists());
    fixture
        .child("layers_missing_metadata.csv")
        .assert(predicate::str::starts_with("layer_id,layer_title"));
}
