//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::MINIMAL);
//!     fixture.command("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::{fixture_xml, TestFixture, BASE_URL};
}

/// API root used by in-memory services in tests.
#[allow(dead_code)]
pub const BASE_URL: &str = "https://data.example.com/services/api/v1.x/";

/// The ISO-19139 test document: contains "Kelp" and "kelp", "Wellington"
/// (capitalised only), and no "Gore".
#[allow(dead_code)]
pub fn fixture_xml() -> &'static str {
    include_str!("../testdata/TEST_metadata_file.iso.xml")
}

/// Common configuration YAML snippets for testing.
///
/// None of these point at a reachable data service: the domain is a closed
/// local port, so a `run` fails fast on connection errors.
#[allow(dead_code)]
pub mod configs {
    /// Valid configuration with one whole-file and one element-scoped rule.
    pub const MINIMAL: &str = r#"
Connection:
  Domain: http://127.0.0.1:9
  Api_key: test-key-123
Text:
  Mapping:
    1:
      search: Kelp
      replace: Seaweed
      ignore_case: True
    2:
      search: 'CC-BY 3\.0'
      replace: CC-BY 4.0
      ignore_case: False
      target_element: .//gmd:useLimitation/gco:CharacterString
Datasets:
  Layers: [50285]
Test:
  Dry_run: True
  Overwrite_files: True
"#;

    /// Configuration with no rules that only summarizes.
    pub const SUMMARIZE_ONLY: &str = r#"
Connection:
  Domain: http://127.0.0.1:9
  Api_key: test-key-123
Text:
  Mapping:
Datasets:
  Layers: ALL
Test:
  Dry_run: False
  Overwrite_files: False
Summarize: True
"#;

    /// Configuration without an API key.
    pub const NO_API_KEY: &str = r#"
Connection:
  Domain: http://127.0.0.1:9
Text:
  Mapping:
    1:
      search: Kelp
      replace: Seaweed
Datasets:
  Layers: [1]
Test:
  Dry_run: True
  Overwrite_files: True
"#;

    /// Configuration with a search pattern that does not compile.
    pub const BAD_REGEX: &str = r#"
Connection:
  Domain: http://127.0.0.1:9
  Api_key: test-key-123
Text:
  Mapping:
    1:
      search: '(unclosed'
      replace: x
Datasets:
  Layers: [1]
Test:
  Dry_run: True
  Overwrite_files: True
"#;

    /// Configuration with an unusable target element path.
    pub const BAD_TARGET: &str = r#"
Connection:
  Domain: http://127.0.0.1:9
  Api_key: test-key-123
Text:
  Mapping:
    1:
      search: x
      replace: y
      target_element: 'gmd:abstract[1]'
Datasets:
  Layers: [1]
Test:
  Dry_run: True
  Overwrite_files: True
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "Connection: [unclosed";
}

/// A temporary directory holding a `config.yaml`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `config.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("config.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running `subcommand --config <fixture config>` in this
    /// fixture's directory, with the API key and config overrides cleared.
    pub fn command(&self, subcommand: &str) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("lds-metadata-updater");
        cmd.current_dir(self.path())
            .env_remove("LDS_APIKEY")
            .env_remove("LDS_METADATA_UPDATER_CONFIG")
            .env_remove("RUST_LOG")
            .arg(subcommand)
            .arg("--config")
            .arg(self.config_path())
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
