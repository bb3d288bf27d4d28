//! # Run Orchestration
//!
//! Runs the whole update over the configured layers, one layer at a time:
//!
//! 1. **Fetch** the layer, retrying transient failures.
//! 2. **Download** its metadata document, honouring the overwrite policy.
//!    Layers without metadata are recorded for the missing-metadata report.
//! 3. **Summarize** the document when reports are enabled.
//! 4. **Edit**: each rule that matches is applied in order, with a single
//!    backup taken before the first edit.
//! 5. **Draft**: unless this is a dry run, the edited document is pushed into
//!    a fresh draft, which joins the publish batch.
//!
//! After the last layer the batch is published in one request and the
//! reports are written.
//!
//! A failure affecting one layer is logged, counted in the [`RunTally`] and
//! skips that layer only. Only configuration problems abort the run.

use crate::config::{Config, DatasetSelector};
use crate::defaults::{FETCH_ATTEMPTS, FETCH_BASE_DELAY, FETCH_MAX_DELAY};
use crate::detect::has_match;
use crate::draft::DraftLifecycle;
use crate::error::{Error, Result};
use crate::filesystem::{create_backup, remove_if_exists, write_atomic};
use crate::path::metadata_file_name;
use crate::publish::PublishBatch;
use crate::remote::{CatalogKind, DataService, Layer};
use crate::report::{write_missing_metadata_report, write_summary_report, MissingMetadata};
use crate::rule::SubstitutionRule;
use crate::substitute;
use crate::summary::{summarize_file, MetadataSummary};
use crate::tally::RunTally;
use backon::{BlockingRetryable, ExponentialBuilder};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bounded retry with capped exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: FETCH_ATTEMPTS,
            base_delay: FETCH_BASE_DELAY,
            max_delay: FETCH_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff schedule between attempts: doubling from `base_delay`,
    /// capped at `max_delay`, one delay per retry.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.attempts.saturating_sub(1) as usize)
    }

    /// Call `operation` until it succeeds, fails with a non-transient error,
    /// or runs out of attempts. The attempt number (from 0) is passed in.
    pub fn run<T>(&self, mut operation: impl FnMut(u32) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        (|| {
            let current = attempt;
            attempt += 1;
            operation(current)
        })
        .retry(self.backoff())
        .sleep(std::thread::sleep)
        .when(Error::is_transient)
        .notify(|e: &Error, delay: Duration| warn!("{}, retrying in {:?}", e, delay))
        .call()
    }
}

/// Everything a run needs besides the data service
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub rules: Vec<SubstitutionRule>,
    pub destination_dir: PathBuf,
    pub datasets: DatasetSelector,
    pub dry_run: bool,
    pub overwrite_files: bool,
    pub summarize: bool,
    pub retry: RetryPolicy,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            rules: config.rules.clone(),
            destination_dir: config.destination_dir.clone(),
            datasets: config.datasets.clone(),
            dry_run: config.dry_run,
            overwrite_files: config.overwrite_files,
            summarize: config.summarize,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Result of a completed run
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub tally: RunTally,
    pub missing_metadata: Vec<MissingMetadata>,
    pub summaries: Vec<MetadataSummary>,
    /// Whether a publish request was accepted.
    pub published: bool,
    /// Report files written.
    pub reports: Vec<PathBuf>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.tally.is_success()
    }
}

/// Runs the per-layer pipeline against a data service
pub struct Orchestrator<'a, S: DataService + ?Sized> {
    service: &'a S,
    settings: RunSettings,
}

impl<'a, S: DataService + ?Sized> Orchestrator<'a, S> {
    pub fn new(service: &'a S, settings: RunSettings) -> Self {
        Self { service, settings }
    }

    /// Process every selected layer, publish and write reports.
    ///
    /// Fails only when the output directory cannot be created.
    pub fn run(&self) -> Result<RunOutcome> {
        let dir = &self.settings.destination_dir;
        std::fs::create_dir_all(dir).map_err(|e| Error::Configuration {
            message: format!("Cannot create output directory {}: {}", dir.display(), e),
            hint: Some("Check Output.Destination in the config file".to_string()),
        })?;

        if self.settings.dry_run {
            info!("Dry run: documents are edited locally and nothing is published");
        }

        let mut outcome = RunOutcome::default();
        let mut batch = PublishBatch::new();

        for id in self.layer_ids(&mut outcome.tally) {
            outcome.tally.record_processed();
            self.process_layer(id, &mut outcome, &mut batch);
        }

        if outcome.tally.edited > 0 && !self.settings.dry_run {
            outcome.published = batch.submit(self.service, false, &mut outcome.tally);
        } else if outcome.tally.edited == 0 {
            info!("No layers were edited; nothing to publish");
        }

        if self.settings.summarize {
            self.write_reports(&mut outcome);
        }

        info!("{}", outcome.tally);
        Ok(outcome)
    }

    fn layer_ids(&self, tally: &mut RunTally) -> Vec<u64> {
        match &self.settings.datasets {
            DatasetSelector::Explicit(ids) => ids.clone(),
            DatasetSelector::All => match self.service.list_catalog() {
                Ok(items) => items
                    .into_iter()
                    .filter_map(|item| match &item.kind {
                        CatalogKind::Layer | CatalogKind::Table => Some(item.id),
                        CatalogKind::Other(kind) => {
                            warn!(
                                "Dataset {}: data is of \"{}\" type. This process only handles tables/layers",
                                item.id, kind
                            );
                            None
                        }
                    })
                    .collect(),
                Err(e) => {
                    error!("Could not list the data catalog: {}", e);
                    tally.record_error();
                    Vec::new()
                }
            },
        }
    }

    fn process_layer(&self, id: u64, outcome: &mut RunOutcome, batch: &mut PublishBatch) {
        let tally = &mut outcome.tally;

        let layer = match self.fetch_layer(id) {
            Ok(layer) => layer,
            Err(e) => {
                error!("Failed to fetch layer {}: {}", id, e);
                tally.record_error();
                return;
            }
        };

        let file = match self.download(&layer) {
            Ok(Some(file)) => file,
            Ok(None) => {
                error!("{}", Error::MetadataUnavailable { layer_id: id });
                outcome.missing_metadata.push(MissingMetadata::from(&layer));
                tally.record_error();
                return;
            }
            Err(e) => {
                error!("Failed to download metadata for layer {}: {}", id, e);
                tally.record_error();
                return;
            }
        };

        if self.settings.summarize {
            match summarize_file(&file, &layer) {
                Ok(summary) => outcome.summaries.push(summary),
                Err(e) => warn!("Could not summarize layer {}: {}", id, e),
            }
        }

        let matched = match self.apply_rules(&file) {
            Ok(matched) => matched,
            Err(e) => {
                error!("Failed to edit metadata for layer {}: {}", id, e);
                tally.record_error();
                return;
            }
        };

        if matched == 0 {
            info!("Layer {}: no rules matched, nothing to update", id);
            return;
        }
        tally.record_document_changed();

        if self.settings.dry_run {
            info!("Layer {}: {} rule(s) applied to {}", id, matched, file.display());
            return;
        }

        if DraftLifecycle::new(self.service).set_metadata(&layer, &file, batch, tally) {
            tally.record_edited();
            info!("Layer {}: metadata updated in draft", id);
        }
    }

    fn fetch_layer(&self, id: u64) -> Result<Layer> {
        self.settings.retry.run(|attempt| {
            if attempt > 0 {
                debug!("Fetching layer {} (attempt {})", id, attempt + 1);
            }
            self.service.fetch_layer(id)
        })
    }

    /// Path of the local metadata document, or `None` when the layer has
    /// none. An existing file is reused unless overwriting is enabled.
    fn download(&self, layer: &Layer) -> Result<Option<PathBuf>> {
        let file = self
            .settings
            .destination_dir
            .join(metadata_file_name(layer.kind, layer.id, &layer.title));

        if !self.settings.overwrite_files && file.exists() {
            debug!("Reusing {}", file.display());
            return Ok(Some(file));
        }
        if remove_if_exists(&file)? {
            debug!("Removed previous copy of {}", file.display());
        }

        match self.service.get_metadata_xml(layer)? {
            Some(xml) => {
                write_atomic(&file, &xml)?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Apply every matching rule in order. Returns how many matched.
    fn apply_rules(&self, file: &Path) -> Result<usize> {
        let mut matched = 0;
        for rule in &self.settings.rules {
            if !has_match(rule, file)? {
                continue;
            }
            if matched == 0 {
                let backup = create_backup(file, self.settings.overwrite_files)?;
                debug!("Backup at {}", backup.display());
            }
            substitute::apply(rule, file)?;
            matched += 1;
        }
        Ok(matched)
    }

    fn write_reports(&self, outcome: &mut RunOutcome) {
        let dir = &self.settings.destination_dir;
        let written = [
            write_summary_report(dir, &outcome.summaries),
            write_missing_metadata_report(dir, &outcome.missing_metadata),
        ];
        for result in written {
            match result {
                Ok(path) => {
                    info!("Report written to {}", path.display());
                    outcome.reports.push(path);
                }
                Err(e) => {
                    error!("{}", e);
                    outcome.tally.record_error();
                }
            }
        }
    }
}
