//! Pipeline state types
//!
//! Contains shared state types used across the pipeline:
//! - PipelineConfig: Settings for a run
//! - Phase: Current stage of the run
//! - ProcessingStatus: The observable progress record
//! - StatusReporter: Single-writer channel carrying ProcessingStatus

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Number of pairs analysed for the preview before embedding starts
pub const PREVIEW_LIMIT: usize = 5;

/// Compression used for entries of the output archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCompression {
    #[default]
    Deflated,
    Stored,
}

/// Settings for a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Embed worker count; derived from CPU cores when unset
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub compression: OutputCompression,
}

impl PipelineConfig {
    /// Effective number of parallel embed workers (at least 1)
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(calculate_worker_count).max(1)
    }
}

/// Calculate the default number of embed workers based on CPU cores
fn calculate_worker_count() -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);

    // Use 75% of cores, clamped between 2 and 8
    ((available as f32 * 0.75).ceil() as usize).clamp(2, 8)
}

/// Current stage of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Extracting,
    Matching,
    Previewing,
    Embedding,
    Assembling,
    Completed,
    Errored,
}

impl Phase {
    pub fn display_text(&self) -> &'static str {
        match self {
            Phase::Idle => "Waiting for archive",
            Phase::Extracting => "Unpacking archive...",
            Phase::Matching => "Matching files...",
            Phase::Previewing => "Reading metadata...",
            Phase::Embedding => "Embedding covers...",
            Phase::Assembling => "Packing result...",
            Phase::Completed => "Processing complete!",
            Phase::Errored => "Processing failed",
        }
    }

    /// `Completed` and `Errored` end a run; only `reset` leaves them
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Errored)
    }

    /// A run is in flight between `Idle` and a terminal phase
    pub fn is_running(&self) -> bool {
        !matches!(self, Phase::Idle) && !self.is_terminal()
    }
}

/// Snapshot of a run's progress, as seen by observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    pub phase: Phase,
    /// 0-100
    pub progress: u8,
    pub processed_count: usize,
    pub total_count: usize,
    pub current_label: String,
    pub error_message: Option<String>,
}

impl Default for ProcessingStatus {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            progress: 0,
            processed_count: 0,
            total_count: 0,
            current_label: Phase::Idle.display_text().to_string(),
            error_message: None,
        }
    }
}

fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        (processed.min(total) * 100 / total) as u8
    }
}

/// Owner of the single `ProcessingStatus` record
///
/// Only the pipeline writes; any number of observers read via `snapshot`
/// or `subscribe`.
#[derive(Debug)]
pub struct StatusReporter {
    tx: watch::Sender<ProcessingStatus>,
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProcessingStatus::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> ProcessingStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProcessingStatus> {
        self.tx.subscribe()
    }

    pub(crate) fn phase(&self) -> Phase {
        self.tx.borrow().phase
    }

    /// Start a run if the pipeline is `Idle`; otherwise report the blocking phase
    ///
    /// The check and the move to `Extracting` happen under one lock.
    pub(crate) fn try_begin(&self) -> Result<(), Phase> {
        let mut blocking = Phase::Idle;
        let started = self.tx.send_if_modified(|status| {
            if status.phase != Phase::Idle {
                blocking = status.phase;
                return false;
            }
            *status = ProcessingStatus {
                phase: Phase::Extracting,
                current_label: Phase::Extracting.display_text().to_string(),
                ..ProcessingStatus::default()
            };
            true
        });

        if started {
            log::info!("Phase: {:?}", Phase::Extracting);
            Ok(())
        } else {
            Err(blocking)
        }
    }

    /// Move to `phase` with its default label
    pub(crate) fn enter(&self, phase: Phase) {
        log::info!("Phase: {:?}", phase);
        self.tx.send_modify(|status| {
            status.phase = phase;
            status.current_label = phase.display_text().to_string();
        });
    }

    /// Fix the total once matching completes
    pub(crate) fn set_total(&self, total: usize) {
        self.tx.send_modify(|status| {
            status.total_count = total;
            status.processed_count = status.processed_count.min(total);
            status.progress = percent(status.processed_count, total);
        });
    }

    /// Count one more processed pair and label it
    pub(crate) fn record_processed(&self, label: &str) {
        self.tx.send_modify(|status| {
            status.processed_count = (status.processed_count + 1).min(status.total_count);
            status.progress = percent(status.processed_count, status.total_count);
            status.current_label = label.to_string();
        });
    }

    pub(crate) fn complete(&self) {
        log::info!("Phase: {:?}", Phase::Completed);
        self.tx.send_modify(|status| {
            status.phase = Phase::Completed;
            status.processed_count = status.total_count;
            status.progress = 100;
            status.current_label = Phase::Completed.display_text().to_string();
            status.error_message = None;
        });
    }

    pub(crate) fn fail(&self, message: String) {
        log::error!("Run failed: {}", message);
        self.tx.send_modify(|status| {
            status.phase = Phase::Errored;
            status.current_label = Phase::Errored.display_text().to_string();
            status.error_message = Some(message);
        });
    }

    pub(crate) fn reset(&self) {
        self.tx.send_replace(ProcessingStatus::default());
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_worker_count() {
        let count = calculate_worker_count();
        assert!((2..=8).contains(&count));
    }

    #[test]
    fn test_worker_count_override() {
        let config = PipelineConfig {
            workers: Some(3),
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 3);

        let config = PipelineConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());

        let config: PipelineConfig =
            serde_json::from_str(r#"{"workers": 2, "compression": "stored"}"#).unwrap();
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.compression, OutputCompression::Stored);
    }

    #[test]
    fn test_phase_classification() {
        assert!(!Phase::Idle.is_running());
        assert!(Phase::Embedding.is_running());
        assert!(Phase::Completed.is_terminal());
        assert!(Phase::Errored.is_terminal());
        assert!(!Phase::Assembling.is_terminal());
    }

    #[test]
    fn test_progress_floors() {
        let reporter = StatusReporter::new();
        reporter.set_total(3);
        reporter.record_processed("audio_001.mp3");
        assert_eq!(reporter.snapshot().progress, 33);
        reporter.record_processed("audio_002.mp3");
        assert_eq!(reporter.snapshot().progress, 66);
        reporter.record_processed("audio_003.mp3");

        let status = reporter.snapshot();
        assert_eq!(status.progress, 100);
        assert_eq!(status.processed_count, 3);
        assert_eq!(status.current_label, "audio_003.mp3");
    }

    #[test]
    fn test_processed_never_exceeds_total() {
        let reporter = StatusReporter::new();
        reporter.set_total(1);
        reporter.record_processed("a");
        reporter.record_processed("b");
        assert_eq!(reporter.snapshot().processed_count, 1);
        assert_eq!(reporter.snapshot().progress, 100);
    }

    #[test]
    fn test_complete_forces_counts() {
        let reporter = StatusReporter::new();
        reporter.set_total(4);
        reporter.record_processed("a");
        reporter.complete();

        let status = reporter.snapshot();
        assert_eq!(status.phase, Phase::Completed);
        assert_eq!(status.progress, 100);
        assert_eq!(status.processed_count, 4);
    }

    #[test]
    fn test_fail_and_reset() {
        let reporter = StatusReporter::new();
        reporter.enter(Phase::Extracting);
        reporter.fail("could not read archive.".to_string());

        let status = reporter.snapshot();
        assert_eq!(status.phase, Phase::Errored);
        assert_eq!(status.error_message.as_deref(), Some("could not read archive."));

        reporter.reset();
        assert_eq!(reporter.snapshot(), ProcessingStatus::default());
    }

    #[test]
    fn test_try_begin_only_from_idle() {
        let reporter = StatusReporter::new();
        assert!(reporter.try_begin().is_ok());
        assert_eq!(reporter.phase(), Phase::Extracting);
        assert_eq!(reporter.try_begin(), Err(Phase::Extracting));

        reporter.complete();
        assert_eq!(reporter.try_begin(), Err(Phase::Completed));
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let reporter = StatusReporter::new();
        let mut rx = reporter.subscribe();

        reporter.enter(Phase::Matching);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, Phase::Matching);
    }
}
