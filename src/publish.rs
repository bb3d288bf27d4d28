//! Publish batch accumulation
//!
//! Every draft updated during a run is collected into one [`PublishBatch`]
//! and submitted once at the end, so all edited layers go live together.

use crate::remote::{DataService, Draft, LayerKind};
use crate::tally::RunTally;
use log::{error, info};
use serde::Serialize;

/// How the service should publish the items of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStrategy {
    /// Publish all items at the same moment.
    Together,
}

/// What the service should do when one item fails to publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStrategy {
    /// Publish nothing if any item fails.
    Abort,
}

/// Body of a publish request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRequest {
    /// Draft version URLs.
    pub items: Vec<String>,
    pub publish_strategy: PublishStrategy,
    pub error_strategy: ErrorStrategy,
}

/// Drafts waiting to be published, bucketed by kind
#[derive(Debug, Clone, Default)]
pub struct PublishBatch {
    layer_items: Vec<String>,
    table_items: Vec<String>,
}

impl PublishBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a draft. Adding the same draft twice has no effect.
    pub fn add(&mut self, draft: &Draft) {
        let bucket = match draft.kind {
            LayerKind::Layer => &mut self.layer_items,
            LayerKind::Table => &mut self.table_items,
        };
        if !bucket.contains(&draft.url) {
            bucket.push(draft.url.clone());
        }
    }

    pub fn layer_items(&self) -> &[String] {
        &self.layer_items
    }

    pub fn table_items(&self) -> &[String] {
        &self.table_items
    }

    pub fn len(&self) -> usize {
        self.layer_items.len() + self.table_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The request that [`submit`](Self::submit) sends
    pub fn to_request(&self) -> PublishRequest {
        PublishRequest {
            items: self
                .layer_items
                .iter()
                .chain(&self.table_items)
                .cloned()
                .collect(),
            publish_strategy: PublishStrategy::Together,
            error_strategy: ErrorStrategy::Abort,
        }
    }

    /// Send the batch as a single publish request.
    ///
    /// Nothing is sent for an empty batch or in dry-run mode. A rejected
    /// request is logged and counted as one error; drafts already updated
    /// stay updated. Returns whether the request was accepted.
    pub fn submit<S: DataService + ?Sized>(&self, service: &S, dry_run: bool, tally: &mut RunTally) -> bool {
        if self.is_empty() {
            info!("No drafts to publish");
            return false;
        }
        if dry_run {
            info!("Dry run: not publishing {} draft(s)", self.len());
            return false;
        }

        match service.create_publish(&self.to_request()) {
            Ok(()) => {
                info!(
                    "Published {} layer(s) and {} table(s)",
                    self.layer_items.len(),
                    self.table_items.len()
                );
                true
            }
            Err(e) => {
                error!("Publishing failed with {}", e);
                tally.record_error();
                false
            }
        }
    }
}
