//! Archive transformation pipeline
//!
//! One run takes a zip buffer through
//! `Extracting -> Matching -> Previewing -> Embedding -> Assembling -> Completed`,
//! or into `Errored` from any of them. Progress is published through the
//! pipeline's [`StatusReporter`]; the pipeline is its only writer.
//!
//! Per-pair embed failures never fail a run: the original audio is passed
//! through and the failure is counted in the [`RunReport`].

mod parallel;
mod report;

pub use parallel::{embed_pairs_parallel, stage_pair, PairOutcome, StagedPair};
pub use report::{EntryReport, RunReport};

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::archive::{read_archive, write_archive, ArchiveEntry};
use crate::audio::{analyze, PreviewEntry};
use crate::core::{
    match_pairs, plain_output_name, Pair, Phase, PipelineConfig, ProcessingStatus,
    StatusReporter, PREVIEW_LIMIT,
};
use crate::error::{PipelineError, Result};

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Encoded output zip
    pub archive: Vec<u8>,
    /// Pairs whose cover was embedded
    pub embedded_count: usize,
    pub report: RunReport,
}

/// Runs the transformation and owns the run's observable state
#[derive(Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    status: StatusReporter,
    preview: Mutex<Vec<PreviewEntry>>,
}

/// Run blocking work off the async executor; a panic becomes `Processing`
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PipelineError::Processing(format!("background task failed: {}", e)))
}

/// Analyse the first `PREVIEW_LIMIT` pairs; failures become empty metadata
fn build_preview(pairs: &[Pair]) -> Vec<PreviewEntry> {
    pairs
        .iter()
        .take(PREVIEW_LIMIT)
        .map(|pair| {
            let metadata = analyze(&pair.audio.data);
            PreviewEntry::new(pair.audio.path.clone(), metadata, pair.is_complete())
        })
        .collect()
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            status: StatusReporter::new(),
            preview: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current status snapshot
    pub fn status(&self) -> ProcessingStatus {
        self.status.snapshot()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<ProcessingStatus> {
        self.status.subscribe()
    }

    /// Preview rows staged during `Previewing` (empty before that)
    pub fn preview(&self) -> Vec<PreviewEntry> {
        self.preview
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return to `Idle`, clearing status and preview data
    ///
    /// Refused while a run is in flight.
    pub fn reset(&self) -> Result<()> {
        let phase = self.status.phase();
        if phase.is_running() {
            return Err(PipelineError::Busy { phase });
        }
        self.preview
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.status.reset();
        log::debug!("Pipeline reset");
        Ok(())
    }

    /// Transform a zip buffer into a zip of cover-embedded audio files
    ///
    /// Only accepted from `Idle`. On failure the status ends in `Errored`
    /// with the error's user message and no output is produced.
    pub async fn process(&self, archive: Vec<u8>) -> Result<PipelineOutput> {
        if let Err(phase) = self.status.try_begin() {
            return Err(if phase.is_terminal() {
                PipelineError::ResetRequired { phase }
            } else {
                PipelineError::Busy { phase }
            });
        }

        let run_id = Uuid::new_v4();
        log::info!("Run {} started ({} bytes)", run_id, archive.len());

        match self.run(run_id, archive).await {
            Ok(output) => {
                self.status.complete();
                log::info!(
                    "Run {} complete: {} files, {} with covers, {} embed failures",
                    run_id,
                    output.report.total_count,
                    output.embedded_count,
                    output.report.failed_count
                );
                Ok(output)
            }
            Err(e) => {
                self.status.fail(e.user_message());
                Err(e)
            }
        }
    }

    async fn run(&self, run_id: Uuid, archive: Vec<u8>) -> Result<PipelineOutput> {
        let started_at = Utc::now();

        let entries = run_blocking(move || read_archive(&archive))
            .await?
            .map_err(PipelineError::InvalidArchive)?;

        self.status.enter(Phase::Matching);
        let matched = match_pairs(entries);
        if matched.pairs.is_empty() {
            return Err(PipelineError::EmptyArchive);
        }
        self.status.set_total(matched.total_count());
        log::info!(
            "Matched {} audio files, {} with covers",
            matched.total_count(),
            matched.complete_count()
        );

        self.status.enter(Phase::Previewing);
        let preview = build_preview(&matched.pairs);
        *self.preview.lock().unwrap_or_else(PoisonError::into_inner) = preview;

        self.status.enter(Phase::Embedding);
        let staged = embed_pairs_parallel(matched.pairs, self.config.worker_count(), |pair| {
            self.status.record_processed(&plain_output_name(&pair.key));
        })
        .await?;

        self.status.enter(Phase::Assembling);
        let mut report = RunReport::new(run_id, started_at, &staged, matched.summary);
        let entries: Vec<ArchiveEntry> = staged.into_iter().map(|s| s.entry).collect();
        let compression = self.config.compression;
        let archive = run_blocking(move || write_archive(&entries, compression))
            .await?
            .map_err(|e| PipelineError::Processing(e.to_string()))?;
        report.mark_finished();

        Ok(PipelineOutput {
            archive,
            embedded_count: report.embedded_count,
            report,
        })
    }
}
