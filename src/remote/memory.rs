//! In-memory data service
//!
//! Holds layers, metadata documents and drafts in process and records every
//! mutating call, so runs can be driven and inspected without a network.
//! Individual operations can be made to fail to exercise error paths.

use super::{CatalogItem, CatalogKind, DataService, Draft, DraftState, Layer, LayerKind};
use crate::error::{Error, Result};
use crate::publish::PublishRequest;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

/// An operation that can be forced to fail with an HTTP 500
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ListCatalog,
    GetDraft,
    CreateDraft,
    DeleteDraft,
    SetMetadata,
    Publish,
}

#[derive(Debug, Default)]
struct State {
    layers: BTreeMap<u64, Layer>,
    metadata: HashMap<u64, Vec<u8>>,
    drafts: HashMap<u64, Draft>,
    catalog_extras: Vec<CatalogItem>,
    /// Remaining forced failures and the status they carry, per layer id.
    fetch_failures: HashMap<u64, (u32, Option<u16>)>,
    fail_points: HashSet<FailPoint>,
    fetch_attempts: HashMap<u64, u32>,
    uploaded: HashMap<u64, Vec<u8>>,
    published: Vec<PublishRequest>,
    deleted: Vec<(u64, u64)>,
    next_version: u64,
}

/// A [`DataService`] that keeps everything in memory
#[derive(Debug)]
pub struct InMemoryDataService {
    base_url: String,
    state: RefCell<State>,
}

impl InMemoryDataService {
    /// Create an empty service whose URLs are rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: RefCell::new(State {
                next_version: 1000,
                ..State::default()
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Add a layer, optionally with a metadata document
    pub fn with_layer(mut self, layer: Layer, metadata: Option<&str>) -> Self {
        let state = self.state.get_mut();
        if let Some(xml) = metadata {
            state.metadata.insert(layer.id, xml.as_bytes().to_vec());
        }
        state.layers.insert(layer.id, layer);
        self
    }

    /// Give a layer an outstanding draft in the given state
    pub fn with_draft(mut self, layer_id: u64, draft_state: DraftState) -> Self {
        let base_url = self.base_url.clone();
        let state = self.state.get_mut();
        let version_id = state.next_version;
        state.next_version += 1;

        let kind = state.layers.get(&layer_id).map_or(LayerKind::Layer, |l| l.kind);
        let url = version_url(&base_url, layer_id, version_id);
        if let Some(layer) = state.layers.get_mut(&layer_id) {
            layer.latest_version = url.clone();
        }
        state.drafts.insert(
            layer_id,
            Draft {
                layer_id,
                version_id,
                kind,
                url,
                state: draft_state,
            },
        );
        self
    }

    /// Make the next `times` fetches of a layer fail. `status: None` is a
    /// transport failure.
    pub fn fail_fetch(mut self, layer_id: u64, times: u32, status: Option<u16>) -> Self {
        self.state
            .get_mut()
            .fetch_failures
            .insert(layer_id, (times, status));
        self
    }

    /// Make every call of an operation fail
    pub fn fail_on(mut self, point: FailPoint) -> Self {
        self.state.get_mut().fail_points.insert(point);
        self
    }

    /// Add a catalog entry that is not a stored layer (a set, a document, ...)
    pub fn with_catalog_item(mut self, id: u64, kind: &str) -> Self {
        self.state.get_mut().catalog_extras.push(CatalogItem {
            id,
            kind: CatalogKind::from_type(kind),
        });
        self
    }

    /// Metadata most recently uploaded to the layer's draft
    pub fn uploaded_metadata(&self, layer_id: u64) -> Option<Vec<u8>> {
        self.state.borrow().uploaded.get(&layer_id).cloned()
    }

    pub fn publish_requests(&self) -> Vec<PublishRequest> {
        self.state.borrow().published.clone()
    }

    /// `(layer_id, version_id)` of every deleted draft, in order
    pub fn deleted_drafts(&self) -> Vec<(u64, u64)> {
        self.state.borrow().deleted.clone()
    }

    pub fn fetch_attempts(&self, layer_id: u64) -> u32 {
        self.state
            .borrow()
            .fetch_attempts
            .get(&layer_id)
            .copied()
            .unwrap_or(0)
    }

    /// The layer's current draft, if it has one
    pub fn draft(&self, layer_id: u64) -> Option<Draft> {
        self.state.borrow().drafts.get(&layer_id).cloned()
    }

    fn check(&self, point: FailPoint, operation: &str) -> Result<()> {
        if self.state.borrow().fail_points.contains(&point) {
            return Err(Error::RemoteServer {
                operation: operation.to_string(),
                status: Some(500),
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

fn version_url(base_url: &str, layer_id: u64, version_id: u64) -> String {
    format!("{}layers/{}/versions/{}/", base_url, layer_id, version_id)
}

fn not_found(operation: String) -> Error {
    Error::RemoteServer {
        operation,
        status: Some(404),
        message: "Not found".to_string(),
    }
}

impl DataService for InMemoryDataService {
    fn fetch_layer(&self, id: u64) -> Result<Layer> {
        let operation = format!("fetch layer {}", id);
        let mut state = self.state.borrow_mut();
        *state.fetch_attempts.entry(id).or_insert(0) += 1;

        if let Some((remaining, status)) = state.fetch_failures.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::RemoteServer {
                    operation,
                    status: *status,
                    message: "request failed".to_string(),
                });
            }
        }

        state.layers.get(&id).cloned().ok_or_else(|| not_found(operation))
    }

    fn list_catalog(&self) -> Result<Vec<CatalogItem>> {
        self.check(FailPoint::ListCatalog, "list catalog")?;
        let state = self.state.borrow();
        let mut items: Vec<CatalogItem> = state
            .layers
            .values()
            .map(|layer| CatalogItem {
                id: layer.id,
                kind: match layer.kind {
                    LayerKind::Layer => CatalogKind::Layer,
                    LayerKind::Table => CatalogKind::Table,
                },
            })
            .collect();
        items.extend(state.catalog_extras.iter().cloned());
        Ok(items)
    }

    fn get_draft(&self, layer: &Layer) -> Result<Draft> {
        let operation = format!("get draft of layer {}", layer.id);
        self.check(FailPoint::GetDraft, &operation)?;
        self.draft(layer.id).ok_or_else(|| not_found(operation))
    }

    fn create_draft(&self, layer: &Layer) -> Result<Draft> {
        let operation = format!("create draft of layer {}", layer.id);
        self.check(FailPoint::CreateDraft, &operation)?;

        let mut state = self.state.borrow_mut();
        if state.drafts.contains_key(&layer.id) {
            return Err(Error::RemoteServer {
                operation,
                status: Some(409),
                message: "A draft version already exists".to_string(),
            });
        }

        let version_id = state.next_version;
        state.next_version += 1;
        let draft = Draft {
            layer_id: layer.id,
            version_id,
            kind: layer.kind,
            url: version_url(&self.base_url, layer.id, version_id),
            state: DraftState::Clean,
        };
        if let Some(stored) = state.layers.get_mut(&layer.id) {
            stored.latest_version = draft.url.clone();
        }
        state.drafts.insert(layer.id, draft.clone());
        Ok(draft)
    }

    fn delete_draft(&self, layer: &Layer, version_id: u64) -> Result<()> {
        let operation = format!("delete draft {} of layer {}", version_id, layer.id);
        self.check(FailPoint::DeleteDraft, &operation)?;

        let mut state = self.state.borrow_mut();
        if state.drafts.get(&layer.id).is_none_or(|d| d.version_id != version_id) {
            return Err(not_found(operation));
        }
        state.drafts.remove(&layer.id);
        state.deleted.push((layer.id, version_id));
        if let Some(stored) = state.layers.get_mut(&layer.id) {
            stored.latest_version = version_url(&self.base_url, layer.id, stored.version.id);
        }
        Ok(())
    }

    fn set_draft_metadata(&self, draft: &Draft, xml: &[u8], version_id: u64) -> Result<()> {
        let operation = format!("metadata update for {}", draft.layer_id);
        self.check(FailPoint::SetMetadata, &operation)?;

        let mut state = self.state.borrow_mut();
        if state
            .drafts
            .get(&draft.layer_id)
            .is_none_or(|d| d.version_id != version_id)
        {
            return Err(not_found(operation));
        }
        state.uploaded.insert(draft.layer_id, xml.to_vec());
        Ok(())
    }

    fn create_publish(&self, request: &PublishRequest) -> Result<()> {
        self.check(FailPoint::Publish, "publish")?;
        self.state.borrow_mut().published.push(request.clone());
        Ok(())
    }

    fn get_metadata_xml(&self, layer: &Layer) -> Result<Option<Vec<u8>>> {
        Ok(self.state.borrow().metadata.get(&layer.id).cloned())
    }
}
