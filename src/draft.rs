//! # Draft Lifecycle
//!
//! A layer's metadata can only be changed through a draft version. This
//! module makes sure each layer has exactly one usable draft before its
//! metadata is pushed:
//!
//! - **No draft outstanding**: a new draft is created.
//! - **Draft outstanding, not publishing**: the old draft is deleted and a
//!   fresh one created, so edits never land on someone else's half-finished
//!   changes. A draft whose publish status is not reported is treated the
//!   same way.
//! - **Draft outstanding, already in a publish group**: the layer is blocked
//!   for this run. A critical message is logged and one error counted.
//!
//! Whether a draft is outstanding is worked out locally by comparing the
//! published version id against the id embedded in the layer's
//! `latest_version` URL.

use crate::error::{Error, Result};
use crate::publish::PublishBatch;
use crate::remote::{DataService, Draft, DraftState, Layer};
use crate::tally::RunTally;
use log::{error, info};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static VERSION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"versions/([0-9]+)/").expect("valid version regex"));

/// Version id embedded in the layer's `latest_version` URL.
///
/// The last `versions/{id}/` segment wins.
pub fn latest_version_id(layer: &Layer) -> Result<u64> {
    VERSION_ID
        .captures_iter(&layer.latest_version)
        .last()
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| Error::RemoteServer {
            operation: format!("read latest version of layer {}", layer.id),
            status: None,
            message: format!("no version id in '{}'", layer.latest_version),
        })
}

/// Whether the layer has an unpublished version newer than its published one
pub fn draft_exists(layer: &Layer) -> Result<bool> {
    Ok(latest_version_id(layer)? != layer.version.id)
}

/// How a usable draft was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAcquisition {
    /// No draft was outstanding.
    Created,
    /// An outstanding draft was deleted and replaced.
    Recreated { deleted_version: u64 },
}

/// Drives the per-layer draft state machine against a [`DataService`]
pub struct DraftLifecycle<'a, S: DataService + ?Sized> {
    service: &'a S,
}

impl<'a, S: DataService + ?Sized> DraftLifecycle<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Obtain a fresh draft for `layer`.
    ///
    /// Fails with `DraftConflict` when the outstanding draft is already in a
    /// publish group, and with `RemoteServer` when any service call fails.
    pub fn acquire(&self, layer: &Layer) -> Result<(Draft, DraftAcquisition)> {
        if !draft_exists(layer)? {
            let draft = self.service.create_draft(layer)?;
            return Ok((draft, DraftAcquisition::Created));
        }

        let existing = self.service.get_draft(layer)?;
        match existing.state {
            DraftState::Conflicted => Err(Error::DraftConflict { layer_id: layer.id }),
            DraftState::Clean | DraftState::Unknown => {
                self.service.delete_draft(layer, existing.version_id)?;
                info!(
                    "A draft already exists for {}. This draft was deleted and a new one created",
                    layer.id
                );
                let draft = self.service.create_draft(layer)?;
                Ok((
                    draft,
                    DraftAcquisition::Recreated {
                        deleted_version: existing.version_id,
                    },
                ))
            }
        }
    }

    /// Obtain a draft, logging and counting any failure.
    ///
    /// Returns `None` when the layer must be left alone for this run. Each
    /// failure adds exactly one error to `tally`.
    pub fn get_draft(&self, layer: &Layer, tally: &mut RunTally) -> Option<Draft> {
        match self.acquire(layer) {
            Ok((draft, _)) => Some(draft),
            Err(Error::DraftConflict { layer_id }) => {
                error!(
                    "A draft already exists for {} and is in a publish group. THIS HAS NOT BEEN UPDATED",
                    layer_id
                );
                tally.record_error();
                None
            }
            Err(e) => {
                error!("Could not get a draft for {}: {}", layer.id, e);
                tally.record_error();
                None
            }
        }
    }

    /// Push the document at `path` into a fresh draft of `layer` and queue
    /// the draft for publishing.
    ///
    /// Returns whether the metadata was set. Failures are logged and
    /// counted; nothing is retried.
    pub fn set_metadata(
        &self,
        layer: &Layer,
        path: &Path,
        batch: &mut PublishBatch,
        tally: &mut RunTally,
    ) -> bool {
        let xml = match std::fs::read(path) {
            Ok(xml) => xml,
            Err(e) => {
                error!("Could not read {}: {}", path.display(), e);
                tally.record_error();
                return false;
            }
        };

        let Some(draft) = self.get_draft(layer, tally) else {
            return false;
        };

        match self.service.set_draft_metadata(&draft, &xml, draft.version_id) {
            Ok(()) => {
                batch.add(&draft);
                true
            }
            Err(e) => {
                error!("metadata update for {} fail with {}", layer.id, e);
                tally.record_error();
                false
            }
        }
    }
}
