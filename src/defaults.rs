//! Default values shared by the CLI and the library.
//!
//! Centralized here so commands and tests agree on file names, environment
//! variables and retry timing.

use std::time::Duration;

/// Config file used when `--config` is not given.
pub const CONFIG_FILE: &str = "config.yaml";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LDS_METADATA_UPDATER_CONFIG";

/// Environment variable that overrides `Connection.Api_key`.
pub const API_KEY_ENV: &str = "LDS_APIKEY";

/// Total attempts made to fetch a layer before giving up.
pub const FETCH_ATTEMPTS: u32 = 4;

/// Delay before the first fetch retry; doubled for each further retry.
pub const FETCH_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on the delay between fetch retries.
pub const FETCH_MAX_DELAY: Duration = Duration::from_secs(8);

/// Timeout applied to every request made to the data service.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Suffix appended to a metadata file name to form its backup.
pub const BACKUP_SUFFIX: &str = "._bak";

/// File name of the metadata summary report.
pub const SUMMARY_REPORT: &str = "metadata_summary.csv";

/// File name of the missing-metadata report.
pub const MISSING_METADATA_REPORT: &str = "layers_missing_metadata.csv";
