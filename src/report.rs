//! CSV reports
//!
//! Two spreadsheets can be written at the end of a run, both with a header
//! row first:
//!
//! - `metadata_summary.csv`: one row per summarized layer.
//! - `layers_missing_metadata.csv`: layers that had no metadata to download.

use crate::defaults::{MISSING_METADATA_REPORT, SUMMARY_REPORT};
use crate::error::{Error, Result};
use crate::filesystem::write_atomic;
use crate::remote::Layer;
use crate::summary::MetadataSummary;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Text of a boolean cell, capitalised the way existing reports spell it
pub fn bool_cell(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn serialize_bool_cell<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(bool_cell(*value))
}

/// A layer found without a metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingMetadata {
    pub layer_id: u64,
    pub layer_title: String,
    pub layer_url: String,
    #[serde(rename = "__license_type")]
    pub license_type: String,
    #[serde(rename = "__license_url")]
    pub license_url: String,
    #[serde(rename = "__is_public", serialize_with = "serialize_bool_cell")]
    pub is_public: bool,
}

impl From<&Layer> for MissingMetadata {
    fn from(layer: &Layer) -> Self {
        Self {
            layer_id: layer.id,
            layer_title: layer.title.clone(),
            layer_url: layer.url.clone(),
            license_type: layer.license_type().unwrap_or_default().to_string(),
            license_url: layer.license_url().unwrap_or_default().to_string(),
            is_public: layer.is_public(),
        }
    }
}

fn report_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Report {
        message: format!("{}: {}", path.display(), e),
    }
}

fn finish(path: &Path, writer: csv::Writer<Vec<u8>>) -> Result<()> {
    let bytes = writer.into_inner().map_err(|e| report_error(path, e))?;
    write_atomic(path, &bytes).map_err(|e| report_error(path, e))
}

/// Write the metadata summary report into `dir`, returning its path
pub fn write_summary_report(dir: &Path, summaries: &[MetadataSummary]) -> Result<PathBuf> {
    let path = dir.join(SUMMARY_REPORT);
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(MetadataSummary::headers())
        .map_err(|e| report_error(&path, e))?;
    for summary in summaries {
        writer
            .write_record(summary.row())
            .map_err(|e| report_error(&path, e))?;
    }

    finish(&path, writer)?;
    Ok(path)
}

/// Write the missing-metadata report into `dir`, returning its path
pub fn write_missing_metadata_report(dir: &Path, missing: &[MissingMetadata]) -> Result<PathBuf> {
    let path = dir.join(MISSING_METADATA_REPORT);
    // headers come from the first serialized record, so write them by hand
    // to keep them present for an empty report
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record([
            "layer_id",
            "layer_title",
            "layer_url",
            "__license_type",
            "__license_url",
            "__is_public",
        ])
        .map_err(|e| report_error(&path, e))?;
    for entry in missing {
        writer.serialize(entry).map_err(|e| report_error(&path, e))?;
    }

    finish(&path, writer)?;
    Ok(path)
}
