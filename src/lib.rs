//! # LDS Metadata Updater Library
//!
//! This library synchronizes ISO-19139 metadata documents for layers hosted on
//! a Koordinates-based data service (such as the LINZ Data Service). For each
//! layer it downloads the metadata XML, applies an ordered list of configured
//! text substitutions, and republishes the edited document through the
//! service's draft/publish workflow.
//!
//! ## Quick Example
//!
//! ```
//! use lds_metadata_updater::path::{metadata_file_name, sanitize_title};
//! use lds_metadata_updater::remote::LayerKind;
//! use lds_metadata_updater::rule::SubstitutionRule;
//!
//! assert_eq!(sanitize_title("NZ: Roads/Tracks"), "NZ RoadsTracks");
//! assert_eq!(
//!     metadata_file_name(LayerKind::Layer, 50772, "NZ Coastlines"),
//!     "layer_50772_NZ Coastlines.iso.xml"
//! );
//!
//! let rule = SubstitutionRule::new("CC-BY 3.0", "CC-BY 4.0").ignore_case(true);
//! assert!(rule.text_has_match("Licensed under cc-by 3.0").unwrap());
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: The YAML settings file: connection details,
//!   substitution rules, dataset selection and run flags.
//! - **Rules (`rule`)**: A single search/replace instruction, optionally scoped
//!   to the text of one XML element.
//! - **Change detection (`detect`)** and **substitution (`substitute`)**: The
//!   read-only "does this rule apply" test and the in-place edit.
//! - **XML (`xml`)**: Namespace-aware parsing, element path selection and
//!   structure-preserving serialization of metadata documents.
//! - **Remote service (`remote`)**: The `DataService` trait with an HTTP
//!   implementation and an in-memory one.
//! - **Draft lifecycle (`draft`)** and **publish batching (`publish`)**: Getting
//!   exactly one usable draft per layer and publishing all drafts together.
//! - **Orchestration (`orchestrator`)**: The per-layer pipeline and the run
//!   tally (`tally`).
//!
//! ## Execution Flow
//!
//! 1.  **Select**: Resolve the configured layer ids, or enumerate the catalog.
//! 2.  **Fetch**: Load each layer, retrying transient failures.
//! 3.  **Download**: Save the layer's metadata document to the output directory.
//! 4.  **Edit**: For each rule that matches, back up once and apply the rule.
//! 5.  **Draft**: Push the edited document into a fresh draft version.
//! 6.  **Publish**: Submit every updated draft in a single publish request.

pub mod config;
pub mod detect;
pub mod draft;
pub mod error;
pub mod filesystem;
pub mod orchestrator;
pub mod output;
pub mod path;
pub mod publish;
pub mod remote;
pub mod report;
pub mod rule;
pub mod substitute;
pub mod summary;
pub mod tally;
pub mod xml;

pub mod defaults;

#[cfg(test)]
mod path_proptest;
