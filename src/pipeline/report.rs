//! Per-run summary, serializable to JSON

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parallel::{PairOutcome, StagedPair};
use crate::core::{MatchSummary, NumericKey};

/// Outcome for one output entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReport {
    pub key: NumericKey,
    pub source: String,
    pub output: String,
    #[serde(flatten)]
    pub outcome: PairOutcome,
}

impl From<&StagedPair> for EntryReport {
    fn from(staged: &StagedPair) -> Self {
        Self {
            key: staged.key.clone(),
            source: staged.source_path.clone(),
            output: staged.entry.path.clone(),
            outcome: staged.outcome.clone(),
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_count: usize,
    pub embedded_count: usize,
    pub failed_count: usize,
    pub pass_through_count: usize,
    pub entries: Vec<EntryReport>,
    /// Audio keys whose earlier entries were replaced (last write wins)
    pub superseded_keys: Vec<NumericKey>,
    pub superseded_covers: Vec<NumericKey>,
    pub rejected_covers: Vec<String>,
}

impl RunReport {
    /// Summarise staged pairs; `finished_at` stays at `started_at` until
    /// [`RunReport::mark_finished`]
    pub(crate) fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        staged: &[StagedPair],
        summary: MatchSummary,
    ) -> Self {
        let count = |wanted: fn(&PairOutcome) -> bool| {
            staged.iter().filter(|s| wanted(&s.outcome)).count()
        };

        Self {
            run_id,
            started_at,
            finished_at: started_at,
            total_count: staged.len(),
            embedded_count: count(|o| matches!(o, PairOutcome::Embedded)),
            failed_count: count(|o| matches!(o, PairOutcome::EmbedFailed { .. })),
            pass_through_count: count(|o| matches!(o, PairOutcome::PassThrough)),
            entries: staged.iter().map(EntryReport::from).collect(),
            superseded_keys: summary.superseded_audio,
            superseded_covers: summary.superseded_covers,
            rejected_covers: summary.rejected_covers,
        }
    }

    pub(crate) fn mark_finished(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Write the report as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        log::debug!("Saved run report to {:?}", path);
        Ok(())
    }

    /// Read a report written by [`RunReport::save`]
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}
