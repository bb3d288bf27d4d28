//! # Configuration Schema and Parsing
//!
//! This module defines the structure of the updater's YAML settings file and
//! the logic for loading and validating it. The file layout follows the
//! long-standing `config.yaml` format used by LDS administrators:
//!
//! ```yaml
//! Connection:
//!   Domain: data.linz.govt.nz
//!   Api_key: <ADMIN API KEY>
//! Text:
//!   Mapping:
//!     1:
//!       search: the terrace
//!       replace: The Road
//!       ignore_case: True
//!     2:
//!       search: 'CC-BY 3\.0'
//!       replace: CC-BY 4.0
//!       ignore_case: False
//!       target_element: gmd:identificationInfo/gmd:MD_DataIdentification/gmd:resourceConstraints/gmd:MD_LegalConstraints/gmd:useLimitation/gco:CharacterString
//! Output:
//!   Destination: ./metadata
//! Datasets:
//!   Layers: ALL
//! Test:
//!   Dry_run: True
//!   Overwrite_files: True
//! Summarize: False
//! ```
//!
//! ## Key Components
//!
//! - **`Config`**: The validated, typed settings handed to the orchestrator.
//! - **`DatasetSelector`**: Either every layer/table in the catalog or an
//!   explicit list of ids.
//! - **`parse` / `from_file`**: Entry points. Every failure is reported as
//!   [`Error::Configuration`], which is fatal for the run.
//!
//! The `LDS_APIKEY` environment variable, when set, takes precedence over the
//! `Api_key` value in the file.

use crate::defaults::API_KEY_ENV;
use crate::error::{Error, Result};
use crate::rule::SubstitutionRule;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Connection details for the data service
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    /// Host name of the data service, e.g. `data.linz.govt.nz`.
    pub domain: String,
    /// Admin API key.
    pub api_key: String,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("domain", &self.domain)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Which layers a run processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSelector {
    /// Every layer and table in the catalog.
    All,
    /// Only the listed layer ids, in order.
    Explicit(Vec<u64>),
}

/// Validated updater settings
#[derive(Debug, Clone)]
pub struct Config {
    pub connection: Connection,
    /// Substitution rules in application order.
    pub rules: Vec<SubstitutionRule>,
    /// Where metadata files, backups and reports are written.
    pub destination_dir: PathBuf,
    pub datasets: DatasetSelector,
    /// Edit local files only; never touch the data service.
    pub dry_run: bool,
    /// Replace existing local metadata files and backups.
    pub overwrite_files: bool,
    /// Write the metadata summary and missing-metadata reports.
    pub summarize: bool,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "Connection")]
    connection: Option<RawConnection>,
    #[serde(rename = "Text")]
    text: Option<RawText>,
    #[serde(rename = "Output")]
    output: Option<RawOutput>,
    #[serde(rename = "Datasets")]
    datasets: Option<RawDatasets>,
    #[serde(rename = "Test")]
    test: Option<RawTest>,
    #[serde(rename = "Summarize", default)]
    summarize: bool,
}

#[derive(Debug, Deserialize)]
struct RawConnection {
    #[serde(rename = "Domain")]
    domain: Option<String>,
    #[serde(rename = "Api_key")]
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawText {
    #[serde(rename = "Mapping")]
    mapping: Option<RawMapping>,
}

/// Rules are keyed by their position (`1:`, `2:`, ...) in the historical
/// format; a plain list is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMapping {
    Numbered(BTreeMap<u32, SubstitutionRule>),
    List(Vec<SubstitutionRule>),
}

impl RawMapping {
    fn into_rules(self) -> Vec<SubstitutionRule> {
        match self {
            RawMapping::Numbered(map) => map.into_values().collect(),
            RawMapping::List(list) => list,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(rename = "Destination")]
    destination: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawDatasets {
    #[serde(rename = "Layers")]
    layers: serde_yaml::Value,
}

#[derive(Debug, Deserialize)]
struct RawTest {
    #[serde(rename = "Dry_run")]
    dry_run: bool,
    #[serde(rename = "Overwrite_files")]
    overwrite_files: bool,
}

/// Parse configuration text, taking the API key override from the environment
pub fn parse(content: &str) -> Result<Config> {
    parse_with_api_key(content, std::env::var(API_KEY_ENV).ok())
}

/// Parse configuration text with an explicit API key override.
///
/// An empty override is ignored.
pub fn parse_with_api_key(content: &str, api_key_override: Option<String>) -> Result<Config> {
    let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| Error::Configuration {
        message: format!("Invalid configuration file: {}", e),
        hint: None,
    })?;

    let connection = raw.connection.ok_or_else(|| missing_section("Connection"))?;
    let api_key = api_key_override
        .filter(|key| !key.trim().is_empty())
        .or(connection.api_key)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::Configuration {
            message: "No LDS API key provided".to_string(),
            hint: Some(format!(
                "Set Connection.Api_key or the {} environment variable",
                API_KEY_ENV
            )),
        })?;
    let domain = connection
        .domain
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| Error::config("Connection.Domain must be set"))?;

    let rules = raw
        .text
        .ok_or_else(|| missing_section("Text"))?
        .mapping
        .map(RawMapping::into_rules)
        .unwrap_or_default();
    for rule in &rules {
        rule.validate()?;
    }

    let destination_dir = match raw.output.and_then(|o| o.destination) {
        Some(dir) => dir,
        None => std::env::current_dir().map_err(|e| Error::Configuration {
            message: format!("No Output.Destination set and the current directory is unavailable: {}", e),
            hint: None,
        })?,
    };

    let datasets = parse_datasets(raw.datasets.ok_or_else(|| missing_section("Datasets"))?.layers)?;
    let test = raw.test.ok_or_else(|| missing_section("Test"))?;

    if rules.is_empty() && !raw.summarize {
        return Err(Error::Configuration {
            message: "No substitution rules configured".to_string(),
            hint: Some("Add entries under Text.Mapping or set Summarize: True".to_string()),
        });
    }

    Ok(Config {
        connection: Connection {
            domain: domain.trim().to_string(),
            api_key: api_key.trim().to_string(),
        },
        rules,
        destination_dir,
        datasets,
        dry_run: test.dry_run,
        overwrite_files: test.overwrite_files,
        summarize: raw.summarize,
    })
}

fn missing_section(name: &str) -> Error {
    Error::Configuration {
        message: format!("No \"{}\" section", name),
        hint: Some("See config_template.yaml for the expected layout".to_string()),
    }
}

fn parse_datasets(value: serde_yaml::Value) -> Result<DatasetSelector> {
    match value {
        serde_yaml::Value::String(s) if s.trim().eq_ignore_ascii_case("all") => Ok(DatasetSelector::All),
        serde_yaml::Value::Sequence(items) => {
            let ids = items
                .into_iter()
                .map(|item| {
                    let id = match item {
                        serde_yaml::Value::Number(n) => n.as_u64(),
                        serde_yaml::Value::String(s) => s.trim().parse().ok(),
                        _ => None,
                    };
                    id.ok_or_else(|| Error::config("Datasets.Layers entries must be numeric layer ids"))
                })
                .collect::<Result<Vec<u64>>>()?;
            if ids.is_empty() {
                return Err(Error::Configuration {
                    message: "Datasets.Layers is an empty list".to_string(),
                    hint: Some("List layer ids or use ALL".to_string()),
                });
            }
            Ok(DatasetSelector::Explicit(ids))
        }
        other => Err(Error::Configuration {
            message: format!("Datasets.Layers must be ALL or a list of ids, got {:?}", other),
            hint: None,
        }),
    }
}

/// Load configuration from a YAML file
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::Configuration {
        message: format!("Can not read config file {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const TEMPLATE: &str = r#"
Connection:
  Api_key: <ADMIN API KEY>
  Domain: <Data Service Domain>
Text:
  Mapping:
    1:
      search: the terrace
      replace: The Road
      ignore_case: True
    2:
      search: Land Info New Zealand
      replace: Land Information Aoteroa
      ignore_case: True
Output:
  Destination: <Directory>
Datasets:
  Layers: ALL
Test:
  Dry_run: True
  Overwrite_files: True
"#;

    #[test]
    fn test_parse_template() {
        let config = parse_with_api_key(TEMPLATE, None).unwrap();
        assert_eq!(config.connection.domain, "<Data Service Domain>");
        assert_eq!(config.connection.api_key, "<ADMIN API KEY>");
        assert_eq!(
            config.rules,
            vec![
                SubstitutionRule::new("the terrace", "The Road").ignore_case(true),
                SubstitutionRule::new("Land Info New Zealand", "Land Information Aoteroa")
                    .ignore_case(true),
            ]
        );
        assert_eq!(config.destination_dir, PathBuf::from("<Directory>"));
        assert_eq!(config.datasets, DatasetSelector::All);
        assert!(config.dry_run);
        assert!(config.overwrite_files);
        assert!(!config.summarize);
    }

    #[test]
    fn test_numbered_rules_are_ordered_by_key() {
        let yaml = TEMPLATE.replace("    1:", "    3:");
        let config = parse_with_api_key(&yaml, None).unwrap();
        assert_eq!(config.rules[0].search, "Land Info New Zealand");
        assert_eq!(config.rules[1].search, "the terrace");
    }

    #[test]
    fn test_rules_as_list() {
        let yaml = r#"
Connection: { Domain: data.linz.govt.nz, Api_key: abc }
Text:
  Mapping:
    - search: Kelp
      replace: ''
      target_element: .//gmd:abstract/gco:CharacterString
Datasets: { Layers: [123, "456"] }
Test: { Dry_run: False, Overwrite_files: False }
"#;
        let config = parse_with_api_key(yaml, None).unwrap();
        assert_eq!(config.rules.len(), 1);
        assert!(config.rules[0].is_element_scoped());
        assert_eq!(config.datasets, DatasetSelector::Explicit(vec![123, 456]));
    }

    #[test]
    fn test_api_key_override() {
        let config = parse_with_api_key(TEMPLATE, Some("from-env".to_string())).unwrap();
        assert_eq!(config.connection.api_key, "from-env");

        let config = parse_with_api_key(TEMPLATE, Some("  ".to_string())).unwrap();
        assert_eq!(config.connection.api_key, "<ADMIN API KEY>");
    }

    #[test]
    #[serial]
    fn test_environment_api_key_takes_precedence() {
        std::env::set_var(API_KEY_ENV, "from-env");
        let result = parse(TEMPLATE);
        std::env::remove_var(API_KEY_ENV);
        assert_eq!(result.unwrap().connection.api_key, "from-env");
    }

    #[test]
    fn test_missing_api_key() {
        let yaml = TEMPLATE.replace("Api_key: <ADMIN API KEY>", "Api_key:");
        let err = parse_with_api_key(&yaml, None).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("No LDS API key"));
    }

    #[test]
    fn test_missing_sections() {
        for section in ["Connection", "Text", "Datasets", "Test"] {
            let yaml: String = TEMPLATE
                .lines()
                .scan(false, |skipping, line| {
                    if !line.starts_with(' ') {
                        *skipping = line.starts_with(section);
                    }
                    Some(if *skipping { None } else { Some(line) })
                })
                .flatten()
                .collect::<Vec<_>>()
                .join("\n");
            let err = parse_with_api_key(&yaml, Some("key".to_string())).unwrap_err();
            assert!(
                err.to_string().contains(section),
                "expected error naming {}, got {}",
                section,
                err
            );
        }
    }

    #[test]
    fn test_non_boolean_dry_run() {
        let yaml = TEMPLATE.replace("Dry_run: True", "Dry_run: maybe");
        let err = parse_with_api_key(&yaml, None).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_layers_value() {
        let yaml = TEMPLATE.replace("Layers: ALL", "Layers: some");
        assert!(parse_with_api_key(&yaml, None).is_err());
        let yaml = TEMPLATE.replace("Layers: ALL", "Layers: []");
        assert!(parse_with_api_key(&yaml, None).is_err());
        let yaml = TEMPLATE.replace("Layers: ALL", "Layers: [12, abc]");
        assert!(parse_with_api_key(&yaml, None).is_err());
    }

    #[test]
    fn test_layers_all_variants() {
        for value in ["ALL", "all", "All"] {
            let yaml = TEMPLATE.replace("Layers: ALL", &format!("Layers: {}", value));
            let config = parse_with_api_key(&yaml, None).unwrap();
            assert_eq!(config.datasets, DatasetSelector::All);
        }
    }

    #[test]
    fn test_invalid_rule_is_configuration_error() {
        let yaml = TEMPLATE.replace("search: the terrace", "search: '(the terrace'");
        let err = parse_with_api_key(&yaml, None).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_no_rules_requires_summarize() {
        let yaml = r#"
Connection: { Domain: d, Api_key: k }
Text: {}
Datasets: { Layers: [1] }
Test: { Dry_run: True, Overwrite_files: True }
"#;
        assert!(parse_with_api_key(yaml, None).is_err());
        let with_summary = format!("{}Summarize: True\n", yaml);
        let config = parse_with_api_key(&with_summary, None).unwrap();
        assert!(config.rules.is_empty());
        assert!(config.summarize);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = parse_with_api_key(TEMPLATE, Some("secret-key".to_string())).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file("/nonexistent/config.yaml").unwrap_err();
        assert!(err.to_string().contains("Can not read config file"));
    }
}
