//! End-to-end tests for the `validate` command.

mod common;
use common::prelude::*;

#[test]
fn test_validate_lists_rules() {
    let fixture = TestFixture::new().with_config(configs::MINIMAL);

    fixture
        .command("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rules: 2"))
        .stdout(predicate::str::contains("'Kelp' -> 'Seaweed' (whole file, ignore case)"))
        .stdout(predicate::str::contains(
            "in .//gmd:useLimitation/gco:CharacterString",
        ))
        .stdout(predicate::str::contains("Datasets: 1 (50285)"))
        .stdout(predicate::str::contains("[OK] Configuration is valid"));
}

#[test]
fn test_validate_never_prints_api_key() {
    let fixture = TestFixture::new().with_config(configs::MINIMAL);

    fixture
        .command("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("test-key-123").not())
        .stderr(predicate::str::contains("test-key-123").not());
}

#[test]
fn test_validate_summarize_only_warns() {
    let fixture = TestFixture::new().with_config(configs::SUMMARIZE_ONLY);

    fixture
        .command("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Datasets: all layers and tables"))
        .stdout(predicate::str::contains("[WARN] No substitution rules"));
}

#[test]
fn test_validate_rejects_bad_regex() {
    let fixture = TestFixture::new().with_config(configs::BAD_REGEX);

    fixture
        .command("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[FAIL]"))
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn test_validate_rejects_bad_target_element() {
    let fixture = TestFixture::new().with_config(configs::BAD_TARGET);

    fixture
        .command("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("gmd:abstract[1]"));
}

#[test]
fn test_validate_does_not_touch_output_directory() {
    let fixture = TestFixture::new().with_config(configs::MINIMAL);

    fixture.command("validate").assert().success();

    fixture.child("metadata_summary.csv").assert(predicate::path::missing());
    fixture
        .child("layer_50285_NZ Kelp Polygons.iso.xml")
        .assert(predicate::path::missing());
}

#[test]
fn test_validate_config_from_environment() {
    let fixture = TestFixture::new();
    fixture.child("custom.yaml").write_str(configs::MINIMAL).unwrap();

    let mut cmd = cargo_bin_cmd!("lds-metadata-updater");
    cmd.current_dir(fixture.path())
        .env_remove("LDS_APIKEY")
        .env("LDS_METADATA_UPDATER_CONFIG", fixture.path().join("custom.yaml"))
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.yaml"));
}

#[test]
fn test_shipped_template_is_valid() {
    let fixture = TestFixture::new().with_config(include_str!("../config_template.yaml"));

    fixture
        .command("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rules: 2"))
        .stdout(predicate::str::contains("'CC-BY 3\\.0' -> 'CC-BY 4.0'"));
}
