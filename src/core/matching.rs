//! Pairing audio entries with their covers by numeric key
//!
//! Both maps use last-write-wins: a later entry with an already-seen key
//! replaces the earlier one, but the key keeps its first-seen position.

use std::collections::HashMap;

use serde::Serialize;

use super::naming::{identify, FileKind, NumericKey};
use crate::archive::ArchiveEntry;
use crate::audio::detection::is_png_data;

/// One audio entry and, if present, its cover
#[derive(Debug, Clone)]
pub struct Pair {
    pub key: NumericKey,
    pub audio: ArchiveEntry,
    pub cover: Option<ArchiveEntry>,
}

impl Pair {
    /// A pair with a cover gets embedded; one without passes through
    pub fn is_complete(&self) -> bool {
        self.cover.is_some()
    }
}

/// Bookkeeping from a matching pass, for logging and the run report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// Audio keys seen more than once (earlier entries were replaced)
    pub superseded_audio: Vec<NumericKey>,
    /// Cover keys seen more than once
    pub superseded_covers: Vec<NumericKey>,
    /// `.png` entries dropped because their bytes are not PNG
    pub rejected_covers: Vec<String>,
    /// Entries that took no part in pairing
    pub ignored: usize,
}

/// Ordered pairs plus summary; `pairs.len()` is the run's total count
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub pairs: Vec<Pair>,
    pub summary: MatchSummary,
}

impl MatchResult {
    pub fn total_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn complete_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_complete()).count()
    }
}

/// Build pairs from decoded entries, in first-seen audio order
///
/// Returns an empty result when no audio entry carries a key; the caller
/// decides whether that is an error.
pub fn match_pairs(entries: Vec<ArchiveEntry>) -> MatchResult {
    let mut audio_order: Vec<NumericKey> = Vec::new();
    let mut audio: HashMap<NumericKey, ArchiveEntry> = HashMap::new();
    let mut covers: HashMap<NumericKey, ArchiveEntry> = HashMap::new();
    let mut summary = MatchSummary::default();

    for entry in entries {
        let Some((key, kind)) = identify(&entry.path) else {
            summary.ignored += 1;
            continue;
        };

        match kind {
            FileKind::Audio => {
                if let Some(previous) = audio.insert(key.clone(), entry) {
                    log::warn!(
                        "Duplicate audio key {}: {} replaced by a later entry",
                        key,
                        previous.path
                    );
                    summary.superseded_audio.push(key);
                } else {
                    audio_order.push(key);
                }
            }
            FileKind::Cover => {
                if !is_png_data(&entry.data) {
                    log::warn!("Rejected cover {}: not PNG data", entry.path);
                    summary.rejected_covers.push(entry.path);
                    continue;
                }
                if let Some(previous) = covers.insert(key.clone(), entry) {
                    log::warn!(
                        "Duplicate cover key {}: {} replaced by a later entry",
                        key,
                        previous.path
                    );
                    summary.superseded_covers.push(key);
                }
            }
            FileKind::Ignored => summary.ignored += 1,
        }
    }

    let pairs = audio_order
        .into_iter()
        .filter_map(|key| {
            let audio = audio.remove(&key)?;
            let cover = covers.remove(&key);
            Some(Pair { key, audio, cover })
        })
        .collect();

    MatchResult { pairs, summary }
}
