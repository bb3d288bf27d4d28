//! # Remote Data Service
//!
//! The data service (a Koordinates deployment such as the LINZ Data Service)
//! is reached through the [`DataService`] trait. This separates the updater's
//! logic from the HTTP details:
//!
//! - **`KoordinatesClient`**: the real implementation, a blocking `reqwest`
//!   client for the Koordinates v1.x REST API.
//! - **`InMemoryDataService`**: an in-process implementation holding layers,
//!   drafts and metadata in memory, with switchable failure points. Used to
//!   exercise the draft lifecycle and run orchestration without a network.

mod koordinates;
mod memory;

pub use koordinates::KoordinatesClient;
pub use memory::{FailPoint, InMemoryDataService};

use crate::error::Result;
use crate::publish::PublishRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of dataset this tool edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Layer,
    Table,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Layer => write!(f, "layer"),
            LayerKind::Table => write!(f, "table"),
        }
    }
}

/// Licence attached to a layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Reference to a layer version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub id: u64,
    #[serde(default)]
    pub url: Option<String>,
}

/// Links to a layer's metadata documents
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataLinks {
    #[serde(default)]
    pub iso: Option<String>,
}

/// A published layer or table, as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// The currently published version.
    pub version: VersionRef,
    /// URL of the newest version, `.../layers/{id}/versions/{version}/`.
    /// Points past `version` while a draft is outstanding.
    pub latest_version: String,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub num_downloads: Option<u64>,
    #[serde(default)]
    pub first_published_at: Option<String>,
    #[serde(default)]
    pub public_access: Option<String>,
    #[serde(default)]
    pub metadata: Option<MetadataLinks>,
}

impl Layer {
    /// A published layer with no outstanding draft, rooted at `base_url`
    /// (e.g. `https://data.linz.govt.nz/services/api/v1.x/`).
    pub fn new(id: u64, kind: LayerKind, title: impl Into<String>, base_url: &str, version: u64) -> Self {
        let url = format!("{}layers/{}/", base_url, id);
        let version_url = format!("{}versions/{}/", url, version);
        Self {
            id,
            kind,
            title: title.into(),
            version: VersionRef {
                id: version,
                url: Some(version_url.clone()),
            },
            latest_version: version_url,
            license: None,
            num_downloads: None,
            first_published_at: None,
            public_access: None,
            metadata: Some(MetadataLinks {
                iso: Some(format!("{}metadata/iso/", url)),
            }),
            url,
        }
    }

    /// Whether the layer is publicly accessible
    pub fn is_public(&self) -> bool {
        self.public_access.as_deref().is_some_and(|access| !access.is_empty())
    }

    pub fn license_type(&self) -> Option<&str> {
        self.license.as_ref().and_then(|l| l.kind.as_deref())
    }

    pub fn license_url(&self) -> Option<&str> {
        self.license.as_ref().and_then(|l| l.url.as_deref())
    }

    /// URL of the ISO-19139 metadata document, if the layer has one
    pub fn iso_metadata_url(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.iso.as_deref())
    }
}

/// Kind of an item in the data catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogKind {
    Layer,
    Table,
    /// Sets, documents, rasters and anything else this tool does not edit.
    Other(String),
}

impl CatalogKind {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "layer" => CatalogKind::Layer,
            "table" => CatalogKind::Table,
            other => CatalogKind::Other(other.to_string()),
        }
    }

    /// Whether items of this kind carry editable layer metadata
    pub fn is_dataset(&self) -> bool {
        matches!(self, CatalogKind::Layer | CatalogKind::Table)
    }
}

/// An entry in the data catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: u64,
    pub kind: CatalogKind,
}

/// Publish status of an existing draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// Not part of any publish group.
    Clean,
    /// Already queued in an active publish group; must not be touched.
    Conflicted,
    /// The service did not report a publish status.
    Unknown,
}

/// An editable, unpublished version of a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub layer_id: u64,
    pub version_id: u64,
    pub kind: LayerKind,
    /// URL of the draft version, the value added to publish requests.
    pub url: String,
    pub state: DraftState,
}

/// Operations the updater needs from the data service
pub trait DataService {
    /// Fetch a layer or table by id.
    fn fetch_layer(&self, id: u64) -> Result<Layer>;

    /// List every item in the data catalog.
    fn list_catalog(&self) -> Result<Vec<CatalogItem>>;

    /// Fetch the layer's existing draft version.
    fn get_draft(&self, layer: &Layer) -> Result<Draft>;

    /// Create a new draft version of the layer.
    fn create_draft(&self, layer: &Layer) -> Result<Draft>;

    /// Delete a draft version.
    fn delete_draft(&self, layer: &Layer, version_id: u64) -> Result<()>;

    /// Replace the metadata document of a draft version.
    fn set_draft_metadata(&self, draft: &Draft, xml: &[u8], version_id: u64) -> Result<()>;

    /// Submit a publish request for a batch of drafts.
    fn create_publish(&self, request: &PublishRequest) -> Result<()>;

    /// Download the layer's ISO-19139 metadata; `Ok(None)` when it has none.
    fn get_metadata_xml(&self, layer: &Layer) -> Result<Option<Vec<u8>>>;
}
